//! Boundary to the control-panel host
//!
//! The host owns buttons and the user. The bridge pushes definitions and
//! status into it, and the host calls back into the bridge when a command is
//! pressed or a feedback is (de)activated.

use crate::surface::{ActionDefinition, FeedbackDefinition, PresetDefinition, Surface};

/// Connection status shown by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Ok,
    ConnectionFailure,
}

/// Control-panel host
///
/// Called from the bridge's async tasks; implementations must not block.
pub trait PanelHost: Send + Sync {
    fn update_status(&self, status: ConnectionStatus, message: Option<&str>);

    fn set_action_definitions(&self, actions: &[ActionDefinition]);

    fn set_feedback_definitions(&self, feedbacks: &[FeedbackDefinition]);

    fn set_preset_definitions(&self, presets: &[PresetDefinition]);

    /// Ask the host to re-evaluate the given feedback instances
    fn check_feedbacks_by_id(&self, feedback_ids: &[String]);

    /// Publish a whole surface at once
    fn publish_surface(&self, surface: &Surface) {
        self.set_action_definitions(&surface.actions);
        self.set_feedback_definitions(&surface.feedbacks);
        self.set_preset_definitions(&surface.presets);
    }
}
