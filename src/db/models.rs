//! Database Models - the portfolio documents stored in each table (used by serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered set of short labels (tags, skills, hero roles).
/// Values are trimmed, empty values dropped and duplicates removed, also on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ChipSet(Vec<String>);

impl ChipSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value; returns `false` when it was blank or already present
    pub fn push(&mut self, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || self.contains(value) {
            return false;
        }
        self.0.push(value.to_string());
        true
    }

    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|v| v != value);
        self.0.len() != before
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl From<Vec<String>> for ChipSet {
    fn from(values: Vec<String>) -> Self {
        let mut set = ChipSet::new();
        for value in &values {
            set.push(value);
        }
        set
    }
}

impl From<ChipSet> for Vec<String> {
    fn from(set: ChipSet) -> Self {
        set.0
    }
}

impl<const N: usize> From<[&str; N]> for ChipSet {
    fn from(values: [&str; N]) -> Self {
        let mut set = ChipSet::new();
        for value in values {
            set.push(value);
        }
        set
    }
}

/// Named group the skills are filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub name: String,
    #[serde(default = "default_category_icon")]
    pub icon: String,
}

fn default_category_icon() -> String {
    "Code2".to_string()
}

impl SkillCategory {
    pub fn new(name: &str, icon: &str) -> Self {
        Self {
            name: name.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Site owner's profile, one per admin principal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub full_name: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub resume_url: Option<String>,
    pub hero_title: String,
    pub hero_subtitle_prefix: String,
    pub hero_subtitle_suffix: String,
    /// `text` or `text|color` tokens
    pub hero_roles: ChipSet,
    /// `None` until the owner first edits categories; an empty list stays empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_categories: Option<Vec<SkillCategory>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub title: String,
    pub description: String,
    /// First image is the cover
    pub images: Vec<String>,
    pub tags: ChipSet,
    #[serde(alias = "demo", alias = "demo_link")]
    pub demo_url: Option<String>,
    #[serde(alias = "github")]
    pub github_url: Option<String>,
    pub category: String,
}

impl Project {
    pub fn cover(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn add_image(&mut self, url: impl Into<String>) {
        self.images.push(url.into());
    }

    /// Remove the image at `index`; later images move up, so removing the cover
    /// promotes the next one.
    pub fn remove_image(&mut self, index: usize) -> Option<String> {
        (index < self.images.len()).then(|| self.images.remove(index))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    #[serde(alias = "role")]
    pub position: String,
    pub company: String,
    /// Free text, e.g. "2021 - Present"
    pub period: String,
    pub description: String,
    pub skills: ChipSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub name: String,
    /// Name of one of the profile's skill categories
    pub category: String,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
    pub icon: String,
    pub is_active: bool,
}

impl Default for SocialLink {
    fn default() -> Self {
        Self {
            platform: String::new(),
            url: String::new(),
            icon: "Link".to_string(),
            is_active: true,
        }
    }
}

/// Contact form submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub name: String,
    pub email: String,
    #[serde(alias = "message")]
    pub content: String,
    #[serde(alias = "read")]
    pub is_read: bool,
}

/// A stored entity: store-issued id, position and timestamps around the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: Uuid,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

/// The stored profile of one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub owner_id: String,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub profile: Profile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_set_trims_and_dedupes() {
        let mut tags = ChipSet::new();
        assert!(tags.push("  React "));
        assert!(!tags.push("React"));
        assert!(!tags.push("   "));
        assert_eq!(tags.as_slice(), ["React"]);
    }

    #[test]
    fn test_chip_set_dedupes_on_load() {
        let tags: ChipSet = serde_json::from_str(r#"["Rust", "Rust", " ", "Go"]"#).unwrap();
        assert_eq!(tags.as_slice(), ["Rust", "Go"]);
    }

    #[test]
    fn test_project_defaults_to_no_images() {
        let project: Project = serde_json::from_str(r#"{"title": "Demo"}"#).unwrap();
        assert!(project.images.is_empty());
        assert_eq!(project.cover(), None);
    }

    #[test]
    fn test_removing_cover_promotes_next_image() {
        let mut project = Project::default();
        project.add_image("a.png");
        project.add_image("b.png");
        assert_eq!(project.remove_image(0), Some("a.png".to_string()));
        assert_eq!(project.cover(), Some("b.png"));
        assert_eq!(project.remove_image(5), None);
    }

    #[test]
    fn test_legacy_field_names_are_accepted() {
        let exp: Experience =
            serde_json::from_str(r#"{"role": "Engineer", "company": "Acme"}"#).unwrap();
        assert_eq!(exp.position, "Engineer");

        let project: Project = serde_json::from_str(r#"{"demo": "https://x.dev"}"#).unwrap();
        assert_eq!(project.demo_url.as_deref(), Some("https://x.dev"));

        let message: Message = serde_json::from_str(r#"{"read": true}"#).unwrap();
        assert!(message.is_read);
    }

    #[test]
    fn test_record_flattens_document() {
        let record = Record {
            id: Uuid::nil(),
            display_order: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            data: Skill {
                name: "Rust".to_string(),
                category: "Backend".to_string(),
                icon: None,
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], "Rust");
        assert_eq!(value["display_order"], 1);
    }
}
