//! Per-entity configuration: which table a record lives in, what must be filled in
//! before it can be saved, and how its fields are tidied up.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};

use crate::db::models::{Experience, Message, Project, Skill, SocialLink};
use crate::store::Table;

use super::ContentError;

lazy_static! {
    /// Loose address check: something@something.tld, no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

fn require(field: &'static str, value: &str) -> Result<(), ContentError> {
    if value.trim().is_empty() {
        Err(ContentError::Validation(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

pub trait Entity: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static {
    const TABLE: Table;
    /// Singular name used in logs and error messages
    const LABEL: &'static str;

    /// Required-field check run before every write
    fn validate(&self) -> Result<(), ContentError>;

    /// Trim free-text fields before they are stored
    fn normalize(&mut self) {}

    /// Name of the profile skill category this record points at, if any
    fn category_ref(&self) -> Option<&str> {
        None
    }

    /// Admin list filter; `needle` is already lowercased and non-empty
    fn matches(&self, _needle: &str) -> bool {
        true
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl Entity for Project {
    const TABLE: Table = Table::Projects;
    const LABEL: &'static str = "project";

    fn validate(&self) -> Result<(), ContentError> {
        require("title", &self.title)
    }

    fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.category = self.category.trim().to_string();
        self.images.retain(|url| !url.trim().is_empty());
        for link in [&mut self.demo_url, &mut self.github_url] {
            if link.as_deref().is_some_and(|l| l.trim().is_empty()) {
                *link = None;
            }
        }
    }

    fn matches(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle) || contains_ci(&self.category, needle)
    }
}

impl Entity for Experience {
    const TABLE: Table = Table::Experience;
    const LABEL: &'static str = "experience";

    fn validate(&self) -> Result<(), ContentError> {
        require("position", &self.position)?;
        require("company", &self.company)
    }

    fn normalize(&mut self) {
        self.position = self.position.trim().to_string();
        self.company = self.company.trim().to_string();
        self.period = self.period.trim().to_string();
    }
}

impl Entity for Skill {
    const TABLE: Table = Table::Skills;
    const LABEL: &'static str = "skill";

    fn validate(&self) -> Result<(), ContentError> {
        require("name", &self.name)?;
        require("category", &self.category)
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
    }

    fn category_ref(&self) -> Option<&str> {
        Some(&self.category)
    }
}

impl Entity for SocialLink {
    const TABLE: Table = Table::SocialLinks;
    const LABEL: &'static str = "social link";

    fn validate(&self) -> Result<(), ContentError> {
        require("platform", &self.platform)?;
        require("url", &self.url)
    }

    fn normalize(&mut self) {
        self.platform = self.platform.trim().to_string();
        self.url = self.url.trim().to_string();
        if self.icon.trim().is_empty() {
            self.icon = "Link".to_string();
        }
    }
}

impl Entity for Message {
    const TABLE: Table = Table::Messages;
    const LABEL: &'static str = "message";

    fn validate(&self) -> Result<(), ContentError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("content", &self.content)?;
        if !is_valid_email(self.email.trim()) {
            return Err(ContentError::Validation("Invalid email format".to_string()));
        }
        Ok(())
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_requires_title() {
        let project = Project::default();
        assert!(matches!(
            project.validate(),
            Err(ContentError::Validation(msg)) if msg == "title is required"
        ));
    }

    #[test]
    fn test_project_normalize_drops_blank_links() {
        let mut project = Project {
            title: "  Demo ".to_string(),
            demo_url: Some("  ".to_string()),
            github_url: Some("https://github.com/x/y".to_string()),
            images: vec!["".to_string(), "a.png".to_string()],
            ..Default::default()
        };
        project.normalize();
        assert_eq!(project.title, "Demo");
        assert_eq!(project.demo_url, None);
        assert!(project.github_url.is_some());
        assert_eq!(project.images, vec!["a.png"]);
    }

    #[test]
    fn test_skill_points_at_its_category() {
        let skill = Skill {
            name: "Rust".to_string(),
            category: "Backend".to_string(),
            icon: None,
        };
        assert_eq!(skill.category_ref(), Some("Backend"));
        assert_eq!(Project::default().category_ref(), None);
    }

    #[test]
    fn test_message_email_format() {
        let mut message = Message {
            name: "Alice".to_string(),
            email: "a@example.com".to_string(),
            content: "Hi".to_string(),
            is_read: false,
        };
        assert!(message.validate().is_ok());
        message.email = "not-an-email".to_string();
        assert!(message.validate().is_err());
    }
}
