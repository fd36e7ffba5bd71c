//! Skill categories live on the profile; skills point at them by name.
//! Renaming a category moves its skills along, removing one leaves them orphaned.

use serde_json::Value;

use crate::db::models::{Profile, SkillCategory};
use crate::store::CategoryRename;

use super::{Content, ContentError, ContentResult};

/// Categories offered before the owner has declared any
pub const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("前端開發", "Layout"),
    ("後端開發", "Database"),
    ("工具與維運", "Terminal"),
    ("其他技能", "Code2"),
];

pub fn default_categories() -> Vec<SkillCategory> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, icon)| SkillCategory::new(name, icon))
        .collect()
}

/// Declared categories of a profile, or the defaults when it never declared any
pub fn effective_categories(profile: &Profile) -> Vec<SkillCategory> {
    profile
        .skill_categories
        .clone()
        .unwrap_or_else(default_categories)
}

fn position_of(categories: &[SkillCategory], name: &str) -> ContentResult<usize> {
    categories
        .iter()
        .position(|c| c.name == name)
        .ok_or_else(|| ContentError::NotFound {
            label: "category",
            id: name.to_string(),
        })
}

fn clean(category: SkillCategory) -> ContentResult<SkillCategory> {
    let name = category.name.trim().to_string();
    if name.is_empty() {
        return Err(ContentError::Validation("category name is required".to_string()));
    }
    let icon = match category.icon.trim() {
        "" => "Code2".to_string(),
        icon => icon.to_string(),
    };
    Ok(SkillCategory { name, icon })
}

impl Content {
    pub async fn categories(&self) -> ContentResult<Vec<SkillCategory>> {
        Ok(effective_categories(&self.profile().await?.profile))
    }

    async fn write_categories(
        &self,
        categories: &[SkillCategory],
        rename: Option<CategoryRename>,
    ) -> ContentResult<u64> {
        let value: Value = serde_json::to_value(categories)?;
        Ok(self
            .store
            .save_categories(&self.owner_id, value, rename)
            .await?)
    }

    pub async fn add_category(&self, category: SkillCategory) -> ContentResult<Vec<SkillCategory>> {
        let category = clean(category)?;
        let mut categories = self.categories().await?;
        if categories.iter().any(|c| c.name == category.name) {
            return Err(ContentError::Conflict(
                "Category name already exists".to_string(),
            ));
        }
        categories.push(category);
        self.write_categories(&categories, None).await?;
        Ok(categories)
    }

    /// Replace the category called `name`. A new name is cascaded to every skill
    /// filed under the old one; returns the categories and the number of skills moved.
    pub async fn update_category(
        &self,
        name: &str,
        updated: SkillCategory,
    ) -> ContentResult<(Vec<SkillCategory>, u64)> {
        let updated = clean(updated)?;
        let mut categories = self.categories().await?;
        let idx = position_of(&categories, name)?;

        if updated.name != name && categories.iter().any(|c| c.name == updated.name) {
            return Err(ContentError::Conflict(
                "Category name already exists".to_string(),
            ));
        }

        let rename = (updated.name != name).then(|| CategoryRename {
            from: name.to_string(),
            to: updated.name.clone(),
        });
        categories[idx] = updated;

        let moved = self.write_categories(&categories, rename).await?;
        if moved > 0 {
            tracing::info!(
                from = %name,
                to = %categories[idx].name,
                skills = moved,
                "category renamed"
            );
        }
        Ok((categories, moved))
    }

    /// Drop a category from the profile. Its skills stay stored with their
    /// category unchanged and render ungrouped until reassigned.
    pub async fn remove_category(&self, name: &str) -> ContentResult<Vec<SkillCategory>> {
        let mut categories = self.categories().await?;
        let idx = position_of(&categories, name)?;
        categories.remove(idx);
        self.write_categories(&categories, None).await?;
        tracing::info!(category = %name, "category removed, skills orphaned");
        Ok(categories)
    }

    /// Set the category order; `names` must list every category exactly once
    pub async fn reorder_categories(&self, names: &[String]) -> ContentResult<Vec<SkillCategory>> {
        let categories = self.categories().await?;
        if names.len() != categories.len() {
            return Err(ContentError::Conflict(
                "Reorder must list every category exactly once".to_string(),
            ));
        }

        let mut reordered = Vec::with_capacity(categories.len());
        for name in names {
            let idx = position_of(&categories, name)?;
            if reordered.iter().any(|c: &SkillCategory| &c.name == name) {
                return Err(ContentError::Conflict(
                    "Reorder must list every category exactly once".to_string(),
                ));
            }
            reordered.push(categories[idx].clone());
        }

        self.write_categories(&reordered, None).await?;
        Ok(reordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Skill;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn content() -> Content {
        Content::new(Arc::new(MemoryStore::new()), "owner")
    }

    fn skill(name: &str, category: &str) -> Skill {
        Skill {
            name: name.to_string(),
            category: category.to_string(),
            icon: None,
        }
    }

    #[tokio::test]
    async fn test_defaults_until_declared() {
        let content = content();
        let names: Vec<String> = content
            .categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["前端開發", "後端開發", "工具與維運", "其他技能"]);
    }

    #[tokio::test]
    async fn test_rename_cascades_only_to_matching_skills() {
        let content = content();
        let skills = content.collection::<Skill>();
        skills.save(None, skill("React", "前端開發")).await.unwrap();
        skills.save(None, skill("Vue", "前端開發")).await.unwrap();
        skills.save(None, skill("Rust", "後端開發")).await.unwrap();

        let (categories, moved) = content
            .update_category("前端開發", SkillCategory::new("Frontend", "Layout"))
            .await
            .unwrap();
        assert_eq!(moved, 2);
        assert_eq!(categories[0].name, "Frontend");

        let stored: Vec<(String, String)> = skills
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.data.name, r.data.category))
            .collect();
        assert_eq!(
            stored,
            vec![
                ("React".to_string(), "Frontend".to_string()),
                ("Vue".to_string(), "Frontend".to_string()),
                ("Rust".to_string(), "後端開發".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_icon_change_moves_no_skills() {
        let content = content();
        content
            .collection::<Skill>()
            .save(None, skill("Git", "工具與維運"))
            .await
            .unwrap();
        let (_, moved) = content
            .update_category("工具與維運", SkillCategory::new("工具與維運", "GitBranch"))
            .await
            .unwrap();
        assert_eq!(moved, 0);
    }

    #[tokio::test]
    async fn test_remove_orphans_skills() {
        let content = content();
        let skills = content.collection::<Skill>();
        skills.save(None, skill("SEO", "其他技能")).await.unwrap();

        let remaining = content.remove_category("其他技能").await.unwrap();
        assert_eq!(remaining.len(), 3);

        let stored = skills.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].data.category, "其他技能");
    }

    #[tokio::test]
    async fn test_removing_every_category_does_not_restore_defaults() {
        let content = content();
        let skills = content.collection::<Skill>();
        skills.save(None, skill("React", "前端開發")).await.unwrap();

        for (name, _) in DEFAULT_CATEGORIES {
            content.remove_category(name).await.unwrap();
        }
        assert!(content.categories().await.unwrap().is_empty());

        let snapshot = crate::site::SiteSnapshot::load(&content).await.unwrap();
        assert!(snapshot.about.skill_groups.is_empty());
        assert_eq!(snapshot.about.ungrouped.len(), 1);

        let result = skills.save(None, skill("Vue", "前端開發")).await;
        assert!(matches!(result, Err(ContentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_skill_with_undeclared_category_is_rejected() {
        let content = content();
        let result = content
            .collection::<Skill>()
            .save(None, skill("Go", "Nope"))
            .await;
        assert!(matches!(result, Err(ContentError::Validation(_))));
    }

    #[tokio::test]
    async fn test_duplicate_names_conflict() {
        let content = content();
        assert!(matches!(
            content
                .add_category(SkillCategory::new("後端開發", "Server"))
                .await,
            Err(ContentError::Conflict(_))
        ));
        assert!(matches!(
            content
                .update_category("前端開發", SkillCategory::new("後端開發", "Layout"))
                .await,
            Err(ContentError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_reorder_categories() {
        let content = content();
        let names: Vec<String> = ["其他技能", "前端開發", "後端開發", "工具與維運"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let reordered = content.reorder_categories(&names).await.unwrap();
        assert_eq!(reordered[0].name, "其他技能");
        assert!(content.reorder_categories(&names[..2]).await.is_err());
    }
}
