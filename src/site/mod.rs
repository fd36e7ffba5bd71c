/*!
 * Public site
 * Read-only view of the portfolio: every collection is read once and grouped
 * the way the public pages show it.
 */
pub mod carousel;
pub mod hero;

use serde::Serialize;

use crate::content::categories::effective_categories;
use crate::content::{Content, ContentResult};
use crate::db::models::{Experience, Profile, Project, Record, Skill, SocialLink};

pub use carousel::{Carousel, HERO_INTERVAL, IMAGE_INTERVAL};
pub use hero::{Hero, HeroRole};

#[derive(Debug, Clone, Serialize)]
pub struct SkillGroup {
    pub name: String,
    pub icon: String,
    pub skills: Vec<Record<Skill>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct About {
    pub full_name: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub resume_url: Option<String>,
    /// Profile category order; categories without skills are left out
    pub skill_groups: Vec<SkillGroup>,
    /// Skills whose category is no longer declared
    pub ungrouped: Vec<Record<Skill>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectGroup {
    pub category: String,
    pub projects: Vec<Record<Project>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteSnapshot {
    pub hero: Hero,
    pub about: About,
    pub projects: Vec<ProjectGroup>,
    pub experience: Vec<Record<Experience>>,
    pub socials: Vec<Record<SocialLink>>,
}

fn group_skills(
    profile: &Profile,
    skills: Vec<Record<Skill>>,
) -> (Vec<SkillGroup>, Vec<Record<Skill>>) {
    let mut groups: Vec<SkillGroup> = effective_categories(profile)
        .into_iter()
        .map(|c| SkillGroup {
            name: c.name,
            icon: c.icon,
            skills: Vec::new(),
        })
        .collect();

    let mut ungrouped = Vec::new();
    for skill in skills {
        match groups.iter_mut().find(|g| g.name == skill.data.category) {
            Some(group) => group.skills.push(skill),
            None => ungrouped.push(skill),
        }
    }
    groups.retain(|g| !g.skills.is_empty());
    (groups, ungrouped)
}

/// Split projects by category, categories in order of first appearance
pub fn group_projects(projects: Vec<Record<Project>>) -> Vec<ProjectGroup> {
    let mut groups: Vec<ProjectGroup> = Vec::new();
    for project in projects {
        match groups
            .iter_mut()
            .find(|g| g.category == project.data.category)
        {
            Some(group) => group.projects.push(project),
            None => groups.push(ProjectGroup {
                category: project.data.category.clone(),
                projects: vec![project],
            }),
        }
    }
    groups
}

impl SiteSnapshot {
    pub fn assemble(
        profile: &Profile,
        projects: Vec<Record<Project>>,
        experience: Vec<Record<Experience>>,
        skills: Vec<Record<Skill>>,
        socials: Vec<Record<SocialLink>>,
    ) -> Self {
        let (skill_groups, ungrouped) = group_skills(profile, skills);
        Self {
            hero: Hero::from_profile(profile),
            about: About {
                full_name: profile.full_name.clone(),
                bio: profile.bio.clone(),
                avatar_url: profile.avatar_url.clone(),
                resume_url: profile.resume_url.clone(),
                skill_groups,
                ungrouped,
            },
            projects: group_projects(projects),
            experience,
            socials: socials.into_iter().filter(|s| s.data.is_active).collect(),
        }
    }

    pub async fn load(content: &Content) -> ContentResult<Self> {
        let profile = content.profile().await?;
        Ok(Self::assemble(
            &profile.profile,
            content.collection::<Project>().list().await?,
            content.collection::<Experience>().list().await?,
            content.collection::<Skill>().list().await?,
            content.collection::<SocialLink>().list().await?,
        ))
    }
}
