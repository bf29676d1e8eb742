//! `isGroupPlaying` feedback: evaluation, subscriptions and the subscription tick

use futures::future::join_all;
use tracing::debug;

use crate::error::BridgeError;
use crate::model::decompose;

use super::Bridge;

impl Bridge {
    /// Evaluate a feedback from the cached mirror state
    ///
    /// Never touches the network. A missing or unknown selector reads as not
    /// playing.
    pub fn evaluate_feedback(&self, selector: Option<&str>) -> bool {
        match selector
            .ok_or(BridgeError::MissingSelector)
            .and_then(decompose)
        {
            Ok((rundown_id, group_id)) => self.mirror().is_playing(rundown_id, group_id),
            Err(err) => {
                debug!("Cannot evaluate isGroupPlaying feedback: {}", err);
                false
            }
        }
    }

    /// Start watching a group for a feedback instance
    ///
    /// Returns false when no group is selected. The caller is expected to run
    /// [`Bridge::poll_subscriptions`] right after.
    pub fn subscribe_feedback(&self, feedback_id: &str, selector: Option<&str>) -> bool {
        let Some(selector) = selector else {
            debug!("No group selected for isGroupPlaying feedback {}", feedback_id);
            return false;
        };

        debug!("Subscribing feedback {} to group {}", feedback_id, selector);
        self.subscriptions().subscribe(selector, feedback_id);
        true
    }

    /// Stop watching for a feedback instance
    pub fn unsubscribe_feedback(&self, feedback_id: &str, selector: Option<&str>) {
        let removed = self.subscriptions().unsubscribe(feedback_id);
        debug!(
            "Unsubscribed feedback {} from group {} ({} entries)",
            feedback_id,
            selector.unwrap_or("<none>"),
            removed
        );
    }

    /// Distinct groups some feedback is watching
    pub fn active_groups(&self) -> Vec<String> {
        self.subscriptions().active_groups()
    }

    /// Probe every watched group once, then have the host re-check the
    /// feedbacks bound to it
    ///
    /// One probe per group no matter how many feedbacks watch it. A failing
    /// group does not stop the others.
    pub async fn poll_subscriptions(&self) {
        let active = self.active_groups();
        if active.is_empty() {
            return;
        }
        debug!("Subscribed groups: {:?}", active);

        join_all(active.iter().map(|group| self.poll_group(group))).await;
    }

    async fn poll_group(&self, composed: &str) {
        match decompose(composed) {
            Ok((rundown_id, group_id)) => {
                if let Err(err) = self.probe(rundown_id, group_id).await {
                    self.report_failure(&format!("Error probing group {}", composed), &err);
                }
            }
            Err(err) => debug!("Not probing {}: {}", composed, err),
        }

        if self.is_shut_down() {
            return;
        }

        let feedback_ids = self.subscriptions().feedbacks_for(composed);
        if !feedback_ids.is_empty() {
            self.host().check_feedbacks_by_id(&feedback_ids);
        }
    }
}
