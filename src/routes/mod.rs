/**
 * Routes Module
 * API route handlers
 */

pub mod admin;
pub mod auth;
pub mod health;
pub mod public;
pub mod upload;

use serde::{Deserialize, Serialize};

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Success response (for delete)
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}
