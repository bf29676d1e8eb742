//! Play/stop/pause commands

use tracing::{debug, info};

use crate::error::BridgeError;
use crate::model::decompose;
use crate::surface::ActionId;

use super::Bridge;

impl Bridge {
    /// Run a command for the selected group
    ///
    /// Failures are logged (and reported if connectivity is lost) but never
    /// retried and never touch the mirror.
    pub async fn execute_action(&self, action: ActionId, selector: Option<&str>) {
        let parsed = selector
            .ok_or(BridgeError::MissingSelector)
            .and_then(decompose);
        let (rundown_id, group_id) = match parsed {
            Ok(parts) => parts,
            Err(err) => {
                debug!("Ignoring {}: {}", action.as_str(), err);
                return;
            }
        };

        info!("{} {} in rundown {}", action.name(), group_id, rundown_id);
        if let Err(err) = self
            .client()
            .group_operation(action.operation(), rundown_id, group_id)
            .await
        {
            self.report_failure(&format!("{} Action Failed", action.name()), &err);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::bridge::Bridge;
    use crate::client::{Method, RemoteClient};
    use crate::host::ConnectionStatus;
    use crate::surface::ActionId;
    use crate::testing::{RecordingHost, ScriptedTransport};

    #[tokio::test]
    async fn test_end_to_end_play_group() {
        let transport = ScriptedTransport::new();
        let host = RecordingHost::new();
        transport.respond("/rundowns", json!({"rundownIds": ["showA.rundown.json"]}));
        transport.respond(
            "/rundown/?rundownId=showA.rundown.json",
            json!({"rundown": {"groups": [
                {"id": "g1", "name": "Intro", "parts": [{"timeline": [{"obj": {"id": "t1"}}]}]}
            ]}}),
        );
        let bridge = Bridge::new(RemoteClient::new(transport.clone()), host.clone());

        bridge.refresh_structure().await;
        let combined = bridge.mirror().combined_groups().to_vec();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].id, "showA.rundown.json|||g1");
        assert_eq!(combined[0].label, "showA/Intro");

        transport.clear_calls();
        let selector = host.presets()[0].steps[0].down[0].options.group_id.clone();
        bridge.execute_action(ActionId::PlayGroup, Some(&selector)).await;

        assert_eq!(
            transport.calls(),
            vec![(
                Method::Post,
                "/playGroup/?rundownId=showA.rundown.json&groupId=g1".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_stop_and_pause() {
        let transport = ScriptedTransport::new();
        let bridge = Bridge::new(RemoteClient::new(transport.clone()), RecordingHost::new());

        bridge.execute_action(ActionId::StopGroup, Some("r|||g")).await;
        bridge.execute_action(ActionId::PauseGroup, Some("r|||g")).await;

        assert_eq!(
            transport.paths_with("/"),
            vec![
                "/stopGroup/?rundownId=r&groupId=g",
                "/pauseGroup/?rundownId=r&groupId=g"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_selector_is_a_no_op() {
        let transport = ScriptedTransport::new();
        let host = RecordingHost::new();
        let bridge = Bridge::new(RemoteClient::new(transport.clone()), host.clone());

        bridge.execute_action(ActionId::PlayGroup, None).await;
        bridge.execute_action(ActionId::PlayGroup, Some("garbage")).await;

        assert!(transport.calls().is_empty());
        assert!(host.statuses().is_empty());
    }

    #[tokio::test]
    async fn test_failed_command_reports_status_only() {
        let transport = ScriptedTransport::new();
        let host = RecordingHost::new();
        transport.fail("/playGroup/?rundownId=r&groupId=g");
        let bridge = Bridge::new(RemoteClient::new(transport.clone()), host.clone());

        bridge.execute_action(ActionId::PlayGroup, Some("r|||g")).await;

        assert_eq!(transport.calls().len(), 1);
        assert_eq!(host.statuses(), vec![ConnectionStatus::ConnectionFailure]);
        assert!(bridge.mirror().combined_groups().is_empty());
    }
}
