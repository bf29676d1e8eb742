//! Local mirror of SuperConductor rundowns and groups
//!
//! The mirror is replaced wholesale on every structural refresh. Each group's
//! playing flag starts out [`PlayingState::Unknown`] after a refresh and is
//! only filled in again by the next probe.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::client::RemoteGroup;

use super::identifier::{compose, display_rundown_name};

/// Last known playing state of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayingState {
    #[default]
    Unknown,
    Playing,
    Stopped,
}

impl PlayingState {
    /// Unknown reads as not playing
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayingState::Playing)
    }
}

impl From<bool> for PlayingState {
    fn from(playing: bool) -> Self {
        if playing {
            PlayingState::Playing
        } else {
            PlayingState::Stopped
        }
    }
}

/// A group within one rundown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Id, unique within the rundown only
    pub id: String,
    pub name: String,
    /// Timeline object ids, in rundown order
    pub timelines: Vec<String>,
    pub playing: PlayingState,
}

impl From<RemoteGroup> for Group {
    fn from(group: RemoteGroup) -> Self {
        Self {
            id: group.id,
            name: group.name,
            timelines: group.timelines,
            playing: PlayingState::Unknown,
        }
    }
}

/// A group as exposed to the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedGroup {
    /// Composed `<rundownId>|||<groupId>`
    pub id: String,
    /// `<rundown name>/<group name>`
    pub label: String,
    pub group_name: String,
    pub rundown_name: String,
}

/// Result of one completed structural fetch
#[derive(Debug, Clone, Default)]
pub struct StructureSnapshot {
    pub rundown_ids: Vec<String>,
    pub groups: HashMap<String, Vec<Group>>,
}

#[derive(Debug, Default)]
pub struct Mirror {
    rundown_ids: Vec<String>,
    groups: HashMap<String, Vec<Group>>,
    combined: Vec<CombinedGroup>,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole topology with a freshly fetched snapshot
    ///
    /// Returns the combined group list the surface must be rebuilt from.
    pub fn apply(&mut self, snapshot: StructureSnapshot) -> &[CombinedGroup] {
        self.rundown_ids = snapshot.rundown_ids;
        self.groups = snapshot.groups;
        self.combined = combine(&self.rundown_ids, &self.groups);
        &self.combined
    }

    /// No rundowns exist: drop every group
    pub fn clear(&mut self) {
        self.rundown_ids.clear();
        self.groups.clear();
        self.combined.clear();
    }

    /// The rundown list could not be fetched
    ///
    /// Known rundown ids are dropped rather than kept possibly wrong. Group
    /// storage and the combined list stay until the next successful fetch.
    pub fn forget_rundown_ids(&mut self) {
        self.rundown_ids.clear();
    }

    pub fn rundown_ids(&self) -> &[String] {
        &self.rundown_ids
    }

    pub fn combined_groups(&self) -> &[CombinedGroup] {
        &self.combined
    }

    pub fn groups(&self, rundown_id: &str) -> Option<&[Group]> {
        self.groups.get(rundown_id).map(Vec::as_slice)
    }

    pub fn group(&self, rundown_id: &str, group_id: &str) -> Option<&Group> {
        self.groups
            .get(rundown_id)?
            .iter()
            .find(|group| group.id == group_id)
    }

    /// Cached playing flag, `false` when unknown or absent
    pub fn is_playing(&self, rundown_id: &str, group_id: &str) -> bool {
        self.group(rundown_id, group_id)
            .map(|group| group.playing.is_playing())
            .unwrap_or(false)
    }

    /// Store a probe result; returns false if the group no longer exists
    pub fn set_playing(&mut self, rundown_id: &str, group_id: &str, playing: bool) -> bool {
        let group = self
            .groups
            .get_mut(rundown_id)
            .and_then(|groups| groups.iter_mut().find(|group| group.id == group_id));

        match group {
            Some(group) => {
                group.playing = PlayingState::from(playing);
                true
            }
            None => {
                debug!(
                    "Group {} in rundown {} vanished before its probe completed",
                    group_id, rundown_id
                );
                false
            }
        }
    }
}

fn combine(rundown_ids: &[String], groups: &HashMap<String, Vec<Group>>) -> Vec<CombinedGroup> {
    let mut combined = Vec::new();
    for rundown_id in rundown_ids {
        let Some(rundown_groups) = groups.get(rundown_id) else {
            continue;
        };
        let rundown_name = display_rundown_name(rundown_id);

        for group in rundown_groups {
            let id = match compose(rundown_id, &group.id) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Skipping group {:?} of rundown {:?}: {}", group.name, rundown_id, e);
                    continue;
                }
            };
            combined.push(CombinedGroup {
                id,
                label: format!("{}/{}", rundown_name, group.name),
                group_name: group.name.clone(),
                rundown_name: rundown_name.to_string(),
            });
        }
    }
    combined
}
