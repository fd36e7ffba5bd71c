//! Tabbed shell: one active tab, loaded when it is activated.

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::content::{Content, ContentResult, MessagePage, PageRequest};
use crate::db::models::{
    Experience, ProfileRecord, Project, Record, Skill, SkillCategory, SocialLink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdminTab {
    #[default]
    Profile,
    Projects,
    Experience,
    Skills,
    Socials,
    Messages,
}

impl AdminTab {
    pub const ALL: [AdminTab; 6] = [
        AdminTab::Profile,
        AdminTab::Projects,
        AdminTab::Experience,
        AdminTab::Skills,
        AdminTab::Socials,
        AdminTab::Messages,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AdminTab::Profile => "profile",
            AdminTab::Projects => "projects",
            AdminTab::Experience => "experience",
            AdminTab::Skills => "skills",
            AdminTab::Socials => "socials",
            AdminTab::Messages => "messages",
        }
    }
}

impl fmt::Display for AdminTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdminTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdminTab::ALL
            .into_iter()
            .find(|tab| tab.name() == s)
            .ok_or_else(|| format!("Unknown admin tab '{}'", s))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: ProfileRecord,
    /// Declared categories, or the defaults when none are declared yet
    pub categories: Vec<SkillCategory>,
}

/// Data backing one tab
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "tab", content = "data", rename_all = "snake_case")]
pub enum TabView {
    Profile(ProfileView),
    Projects(Vec<Record<Project>>),
    Experience(Vec<Record<Experience>>),
    Skills {
        skills: Vec<Record<Skill>>,
        categories: Vec<SkillCategory>,
    },
    Socials(Vec<Record<SocialLink>>),
    Messages(MessagePage),
}

impl TabView {
    pub fn tab(&self) -> AdminTab {
        match self {
            TabView::Profile(_) => AdminTab::Profile,
            TabView::Projects(_) => AdminTab::Projects,
            TabView::Experience(_) => AdminTab::Experience,
            TabView::Skills { .. } => AdminTab::Skills,
            TabView::Socials(_) => AdminTab::Socials,
            TabView::Messages(_) => AdminTab::Messages,
        }
    }
}

/// Read exactly what `tab` shows. `paging` only applies to the messages tab.
pub async fn load_tab(
    content: &Content,
    tab: AdminTab,
    paging: Option<PageRequest>,
) -> ContentResult<TabView> {
    Ok(match tab {
        AdminTab::Profile => {
            let profile = content.profile().await?;
            let categories = crate::content::categories::effective_categories(&profile.profile);
            TabView::Profile(ProfileView {
                profile,
                categories,
            })
        }
        AdminTab::Projects => TabView::Projects(content.collection::<Project>().list().await?),
        AdminTab::Experience => {
            TabView::Experience(content.collection::<Experience>().list().await?)
        }
        AdminTab::Skills => TabView::Skills {
            skills: content.collection::<Skill>().list().await?,
            categories: content.categories().await?,
        },
        AdminTab::Socials => TabView::Socials(content.collection::<SocialLink>().list().await?),
        AdminTab::Messages => TabView::Messages(content.list_messages(paging).await?),
    })
}

/// Hosts one tab at a time; switching tabs drops the previous tab's data
pub struct AdminShell {
    content: Content,
    active: AdminTab,
    view: Option<TabView>,
}

impl AdminShell {
    pub fn new(content: Content) -> Self {
        Self {
            content,
            active: AdminTab::default(),
            view: None,
        }
    }

    pub fn active(&self) -> AdminTab {
        self.active
    }

    pub fn view(&self) -> Option<&TabView> {
        self.view.as_ref()
    }

    pub async fn activate(&mut self, tab: AdminTab) -> ContentResult<&TabView> {
        self.active = tab;
        self.view = None;
        let paging = (tab == AdminTab::Messages).then(PageRequest::default);
        let view = load_tab(&self.content, tab, paging).await?;
        tracing::debug!(tab = %tab, "admin tab loaded");
        Ok(self.view.insert(view))
    }
}
