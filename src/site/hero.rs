//! Hero section: title, subtitle and the rotating role line.

use serde::Serialize;

use crate::db::models::Profile;

/// Shown while the owner has not entered any roles
pub const DEFAULT_ROLES: [&str; 2] = ["前端工程師", "UX 設計師"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroRole {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl HeroRole {
    /// `text` or `text|color`; a blank color part means the theme color
    pub fn parse(token: &str) -> Option<Self> {
        let (text, color) = match token.split_once('|') {
            Some((text, color)) => (text.trim(), Some(color.trim())),
            None => (token.trim(), None),
        };
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            color: color.filter(|c| !c.is_empty()).map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hero {
    pub title: String,
    pub subtitle_prefix: String,
    pub subtitle_suffix: String,
    pub roles: Vec<HeroRole>,
}

impl Hero {
    pub fn from_profile(profile: &Profile) -> Self {
        let mut roles: Vec<HeroRole> = profile
            .hero_roles
            .iter()
            .filter_map(|token| HeroRole::parse(token))
            .collect();
        if roles.is_empty() {
            roles = DEFAULT_ROLES
                .iter()
                .filter_map(|token| HeroRole::parse(token))
                .collect();
        }

        let title = if profile.hero_title.trim().is_empty() {
            profile.full_name.clone()
        } else {
            profile.hero_title.clone()
        };

        Self {
            title,
            subtitle_prefix: profile.hero_subtitle_prefix.clone(),
            subtitle_suffix: profile.hero_subtitle_suffix.clone(),
            roles,
        }
    }
}
