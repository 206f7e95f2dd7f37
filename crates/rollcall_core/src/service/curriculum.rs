//! Curriculum tab filter.
//!
//! # Responsibility
//! - Map each tab to the set of row classes it shows.
//! - Track the active tab and answer row visibility.
//!
//! # Invariants
//! - Exactly one tab is active after a successful `select`.
//! - Rows whose class no tab mentions are always visible.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ALL_SUBJECTS_TAB: &str = "allsubjects";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumTab {
    pub id: String,
    pub label: String,
    pub classes: BTreeSet<String>,
}

impl CurriculumTab {
    pub fn new<'a>(
        id: impl Into<String>,
        label: impl Into<String>,
        classes: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }
}

/// Outcome of activating a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSelection {
    pub active: String,
    pub shown: BTreeSet<String>,
    pub hidden: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurriculumError {
    UnknownTab(String),
    DuplicateTab(String),
    Malformed(String),
}

impl Display for CurriculumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTab(id) => write!(f, "unknown curriculum tab: {id}"),
            Self::DuplicateTab(id) => write!(f, "curriculum tab declared twice: {id}"),
            Self::Malformed(message) => write!(f, "invalid curriculum table: {message}"),
        }
    }
}

impl Error for CurriculumError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurriculumTabs {
    tabs: Vec<CurriculumTab>,
    active: Option<usize>,
}

impl Default for CurriculumTabs {
    fn default() -> Self {
        const SUBJECTS: [(&str, &str); 5] = [
            ("maths", "Maths"),
            ("datastructure", "Data Structure"),
            ("sensors&transducers", "Sensors & Transducers"),
            ("python", "Python"),
            ("toc", "TOC"),
        ];

        let mut tabs = vec![CurriculumTab::new(
            ALL_SUBJECTS_TAB,
            "All",
            SUBJECTS.iter().map(|(class, _)| *class),
        )];
        tabs.extend(
            SUBJECTS
                .iter()
                .map(|(class, label)| CurriculumTab::new(*class, *label, [*class])),
        );
        Self { tabs, active: None }
    }
}

impl CurriculumTabs {
    pub fn new(tabs: Vec<CurriculumTab>) -> Result<Self, CurriculumError> {
        let mut seen = BTreeSet::new();
        for tab in &tabs {
            if !seen.insert(tab.id.as_str()) {
                return Err(CurriculumError::DuplicateTab(tab.id.clone()));
            }
        }
        Ok(Self { tabs, active: None })
    }

    /// Loads a tab table from a JSON array of `{id, label, classes}`.
    pub fn from_json_str(json: &str) -> Result<Self, CurriculumError> {
        let tabs: Vec<CurriculumTab> =
            serde_json::from_str(json).map_err(|err| CurriculumError::Malformed(err.to_string()))?;
        Self::new(tabs)
    }

    pub fn tabs(&self) -> &[CurriculumTab] {
        &self.tabs
    }

    pub fn active(&self) -> Option<&CurriculumTab> {
        self.active.map(|index| &self.tabs[index])
    }

    /// Every class any tab mentions.
    pub fn known_classes(&self) -> BTreeSet<String> {
        self.tabs
            .iter()
            .flat_map(|tab| tab.classes.iter().cloned())
            .collect()
    }

    pub fn select(&mut self, tab_id: &str) -> Result<TabSelection, CurriculumError> {
        let index = self
            .tabs
            .iter()
            .position(|tab| tab.id == tab_id)
            .ok_or_else(|| CurriculumError::UnknownTab(tab_id.to_string()))?;
        self.active = Some(index);

        let shown = self.tabs[index].classes.clone();
        let hidden = self
            .known_classes()
            .into_iter()
            .filter(|class| !shown.contains(class))
            .collect();
        info!("event=tab_select module=curriculum status=ok tab={tab_id}");

        Ok(TabSelection {
            active: tab_id.to_string(),
            shown,
            hidden,
        })
    }

    pub fn is_row_visible(&self, row_class: &str) -> bool {
        let Some(active) = self.active() else {
            return true;
        };
        if active.classes.contains(row_class) {
            return true;
        }
        !self.tabs.iter().any(|tab| tab.classes.contains(row_class))
    }
}
