//! Prints a bcrypt hash for ADMIN_HASH_PASSWORD.
//!
//! Usage: hash-password <PASSWORD> [--cost N]

use bcrypt::{hash, verify, DEFAULT_COST};
use std::env;
use std::process::exit;

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin hash-password -- <PASSWORD> [--cost N]");
    exit(1);
}

fn main() {
    let mut args = env::args().skip(1);
    let mut password = None;
    let mut cost = DEFAULT_COST;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--cost" => {
                cost = args
                    .next()
                    .and_then(|c| c.parse().ok())
                    .filter(|c| (4..=31).contains(c))
                    .unwrap_or_else(|| {
                        eprintln!("--cost expects a number between 4 and 31");
                        exit(1);
                    });
            }
            "-h" | "--help" => usage(),
            _ if password.is_none() => password = Some(arg),
            _ => usage(),
        }
    }

    let Some(password) = password else { usage() };
    if password.len() < 8 {
        eprintln!("Warning: passwords shorter than 8 characters are easy to guess");
    }

    let hashed = match hash(&password, cost) {
        Ok(hashed) => hashed,
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            exit(1);
        }
    };

    if !verify(&password, &hashed).unwrap_or(false) {
        eprintln!("Generated hash failed verification");
        exit(1);
    }

    println!("\nCost     : {}", cost);
    println!("Hash     : {}\n", hashed);
    println!("# Paste this into your .env (keep ADMIN_EMAIL in sync):");
    println!("ADMIN_HASH_PASSWORD={}", hashed);
}
