//! Commands, feedbacks and presets exposed to the control panel
//!
//! The surface is derived from the mirror's combined group list and rebuilt
//! from scratch on every structural change. It is never patched in place.

use serde::Serialize;

use crate::client::GroupOperation;
use crate::model::CombinedGroup;

/// Option id carrying the composed group selector
pub const GROUP_OPTION_ID: &str = "groupId";

/// Boolean feedback reporting whether a group is playing
pub const FEEDBACK_IS_GROUP_PLAYING: &str = "isGroupPlaying";

const WHITE: u32 = 16_777_215;
const BLACK: u32 = 0;

/// Pack an RGB triple the way the panel expects colors
pub const fn rgb_to_decimal(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionId {
    PlayGroup,
    StopGroup,
    PauseGroup,
}

impl ActionId {
    pub const ALL: [ActionId; 3] = [ActionId::PlayGroup, ActionId::StopGroup, ActionId::PauseGroup];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::PlayGroup => "playGroup",
            ActionId::StopGroup => "stopGroup",
            ActionId::PauseGroup => "pauseGroup",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionId::PlayGroup => "Play Group",
            ActionId::StopGroup => "Stop Group",
            ActionId::PauseGroup => "Pause Group",
        }
    }

    pub fn operation(&self) -> GroupOperation {
        match self {
            ActionId::PlayGroup => GroupOperation::Play,
            ActionId::StopGroup => GroupOperation::Stop,
            ActionId::PauseGroup => GroupOperation::Pause,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
}

/// Dropdown option selecting one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupOption {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: &'static str,
    pub id: &'static str,
    pub choices: Vec<Choice>,
    pub required: bool,
}

impl GroupOption {
    fn new(choices: Vec<Choice>) -> Self {
        Self {
            kind: "dropdown",
            label: "Group",
            id: GROUP_OPTION_ID,
            choices,
            required: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDefinition {
    pub id: ActionId,
    pub name: &'static str,
    pub options: Vec<GroupOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<&'static str>,
    pub color: u32,
    pub bgcolor: u32,
}

impl ButtonStyle {
    /// Black text on green, shown while a group is playing
    pub fn active() -> Self {
        Self {
            text: None,
            size: None,
            color: rgb_to_decimal(0, 0, 0),
            bgcolor: rgb_to_decimal(0, 180, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackDefinition {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    #[serde(rename = "defaultStyle")]
    pub default_style: ButtonStyle,
    pub options: Vec<GroupOption>,
}

/// Options payload referencing one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSelection {
    #[serde(rename = "groupId")]
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRef {
    #[serde(rename = "actionId")]
    pub action_id: ActionId,
    pub options: GroupSelection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetStep {
    pub down: Vec<ActionRef>,
    pub up: Vec<ActionRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRef {
    #[serde(rename = "feedbackId")]
    pub feedback_id: &'static str,
    pub options: GroupSelection,
    pub style: ButtonStyle,
}

/// Ready-made button for one group: press once to play, again to stop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetDefinition {
    /// Composed group id
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub category: String,
    pub name: String,
    pub style: ButtonStyle,
    pub steps: Vec<PresetStep>,
    pub feedbacks: Vec<FeedbackRef>,
}

/// Everything the panel gets to see
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Surface {
    pub actions: Vec<ActionDefinition>,
    pub feedbacks: Vec<FeedbackDefinition>,
    pub presets: Vec<PresetDefinition>,
}

impl Surface {
    pub fn build(groups: &[CombinedGroup]) -> Self {
        Self {
            actions: build_actions(groups),
            feedbacks: build_feedbacks(groups),
            presets: build_presets(groups),
        }
    }
}

fn choices(groups: &[CombinedGroup]) -> Vec<Choice> {
    groups
        .iter()
        .map(|group| Choice {
            id: group.id.clone(),
            label: group.label.clone(),
        })
        .collect()
}

pub fn build_actions(groups: &[CombinedGroup]) -> Vec<ActionDefinition> {
    ActionId::ALL
        .into_iter()
        .map(|id| ActionDefinition {
            id,
            name: id.name(),
            options: vec![GroupOption::new(choices(groups))],
        })
        .collect()
}

pub fn build_feedbacks(groups: &[CombinedGroup]) -> Vec<FeedbackDefinition> {
    vec![FeedbackDefinition {
        id: FEEDBACK_IS_GROUP_PLAYING,
        kind: "boolean",
        name: "Check if group is playing",
        default_style: ButtonStyle::active(),
        options: vec![GroupOption::new(choices(groups))],
    }]
}

pub fn build_presets(groups: &[CombinedGroup]) -> Vec<PresetDefinition> {
    groups.iter().map(preset_for).collect()
}

fn preset_for(group: &CombinedGroup) -> PresetDefinition {
    let step = |action_id| PresetStep {
        down: vec![ActionRef {
            action_id,
            options: GroupSelection {
                group_id: group.id.clone(),
            },
        }],
        up: Vec::new(),
    };

    PresetDefinition {
        id: group.id.clone(),
        kind: "button",
        category: group.rundown_name.clone(),
        name: group.group_name.clone(),
        style: ButtonStyle {
            text: Some(group.group_name.clone()),
            size: Some("auto"),
            color: WHITE,
            bgcolor: BLACK,
        },
        steps: vec![step(ActionId::PlayGroup), step(ActionId::StopGroup)],
        feedbacks: vec![FeedbackRef {
            feedback_id: FEEDBACK_IS_GROUP_PLAYING,
            options: GroupSelection {
                group_id: group.id.clone(),
            },
            style: ButtonStyle::active(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combined(rundown: &str, group: &str, name: &str) -> CombinedGroup {
        let rundown_name = crate::model::display_rundown_name(rundown).to_string();
        CombinedGroup {
            id: crate::model::compose(rundown, group).unwrap(),
            label: format!("{}/{}", rundown_name, name),
            group_name: name.to_string(),
            rundown_name,
        }
    }

    #[test]
    fn test_rgb_to_decimal() {
        assert_eq!(rgb_to_decimal(0, 180, 0), 46080);
        assert_eq!(rgb_to_decimal(255, 255, 255), WHITE);
        assert_eq!(rgb_to_decimal(0, 0, 0), BLACK);
    }

    #[test]
    fn test_action_ids_serialize_as_their_names() {
        for action in ActionId::ALL {
            assert_eq!(serde_json::to_value(action).unwrap(), action.as_str());
        }
        assert_eq!(serde_json::to_value(ActionId::PauseGroup).unwrap(), "pauseGroup");
    }

    #[test]
    fn test_surface_lists_every_group() {
        let groups = vec![
            combined("showA.rundown.json", "g1", "Intro"),
            combined("showA.rundown.json", "g2", "Outro"),
        ];
        let surface = Surface::build(&groups);

        assert_eq!(surface.actions.len(), 3);
        for action in &surface.actions {
            let choices = &action.options[0].choices;
            assert_eq!(choices.len(), 2);
            assert_eq!(choices[0].id, "showA.rundown.json|||g1");
            assert_eq!(choices[0].label, "showA/Intro");
        }
        assert_eq!(surface.feedbacks.len(), 1);
        assert_eq!(surface.feedbacks[0].options[0].choices.len(), 2);
        assert_eq!(surface.presets.len(), 2);
    }

    #[test]
    fn test_preset_binds_play_stop_and_feedback() {
        let surface = Surface::build(&[combined("showA.rundown.json", "g1", "Intro")]);
        let preset = &surface.presets[0];

        assert_eq!(preset.id, "showA.rundown.json|||g1");
        assert_eq!(preset.category, "showA");
        assert_eq!(preset.name, "Intro");
        assert_eq!(preset.style.text.as_deref(), Some("Intro"));
        assert_eq!(preset.steps[0].down[0].action_id, ActionId::PlayGroup);
        assert_eq!(preset.steps[1].down[0].action_id, ActionId::StopGroup);
        assert_eq!(preset.steps[1].down[0].options.group_id, preset.id);
        assert_eq!(preset.feedbacks[0].feedback_id, FEEDBACK_IS_GROUP_PLAYING);
        assert_eq!(preset.feedbacks[0].style, ButtonStyle::active());
    }

    #[test]
    fn test_empty_mirror_still_defines_commands() {
        let surface = Surface::build(&[]);
        assert_eq!(surface.actions.len(), 3);
        assert!(surface.actions[0].options[0].choices.is_empty());
        assert!(surface.presets.is_empty());
    }

    #[test]
    fn test_preset_serializes_with_panel_field_names() {
        let surface = Surface::build(&[combined("r", "g", "G")]);
        let json = serde_json::to_value(&surface.presets[0]).unwrap();
        assert_eq!(json["type"], "button");
        assert_eq!(json["steps"][0]["down"][0]["actionId"], "playGroup");
        assert_eq!(json["steps"][0]["down"][0]["options"]["groupId"], "r|||g");
        assert_eq!(json["feedbacks"][0]["style"]["bgcolor"], 46080);
        assert_eq!(json["style"]["size"], "auto");
    }
}
