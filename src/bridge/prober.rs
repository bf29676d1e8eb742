//! Playback-state probing for a single group

use tracing::debug;

use crate::error::Result;

use super::Bridge;

impl Bridge {
    /// Ask SuperConductor whether any timeline object of a group is playing
    ///
    /// Objects are queried in order and the scan stops at the first one that
    /// plays. The result is cached in the mirror for feedback evaluation.
    /// Unknown groups read as not playing without any request.
    pub async fn probe(&self, rundown_id: &str, group_id: &str) -> Result<bool> {
        let timelines = {
            let mirror = self.mirror();
            if mirror.groups(rundown_id).is_none() {
                debug!("No rundown found for ID {}", rundown_id);
                return Ok(false);
            }
            match mirror.group(rundown_id, group_id) {
                Some(group) => group.timelines.clone(),
                None => {
                    debug!("No group {} found in rundown {}", group_id, rundown_id);
                    return Ok(false);
                }
            }
        };

        let client = self.client();
        for timeline in &timelines {
            if client.is_timeline_obj_playing(rundown_id, timeline).await? {
                debug!(
                    "Timeline {} in group {} in rundown {} is playing",
                    timeline, group_id, rundown_id
                );
                self.store_playing(rundown_id, group_id, true);
                return Ok(true);
            }
        }

        debug!("Group {} in rundown {} is not playing", group_id, rundown_id);
        self.store_playing(rundown_id, group_id, false);
        Ok(false)
    }

    fn store_playing(&self, rundown_id: &str, group_id: &str, playing: bool) {
        if self.is_shut_down() {
            return;
        }
        self.mirror_mut().set_playing(rundown_id, group_id, playing);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::bridge::Bridge;
    use crate::client::RemoteClient;
    use crate::error::BridgeError;
    use crate::model::PlayingState;
    use crate::testing::{RecordingHost, ScriptedTransport};

    const PROBE: &str = "/isTimelineObjPlaying/?rundownId=r&timelineObjId=";

    async fn bridge_with_group(transport: &std::sync::Arc<ScriptedTransport>, timelines: &[&str]) -> Bridge {
        let timeline: Vec<_> = timelines.iter().map(|id| json!({"obj": {"id": id}})).collect();
        transport.respond("/rundowns", json!({"rundownIds": ["r"]}));
        transport.respond(
            "/rundown/?rundownId=r",
            json!({"rundown": {"groups": [{"id": "g", "name": "G", "parts": [{"timeline": timeline}]}]}}),
        );
        let bridge = Bridge::new(RemoteClient::new(transport.clone()), RecordingHost::new());
        bridge.refresh_structure().await;
        transport.clear_calls();
        bridge
    }

    #[tokio::test]
    async fn test_probe_stops_at_first_playing_object() {
        let transport = ScriptedTransport::new();
        let bridge = bridge_with_group(&transport, &["a", "b", "c"]).await;
        transport.respond(&format!("{}a", PROBE), json!(false));
        transport.respond(&format!("{}b", PROBE), json!(true));
        transport.respond(&format!("{}c", PROBE), json!(true));

        assert!(bridge.probe("r", "g").await.unwrap());

        assert_eq!(
            transport.paths_with(PROBE),
            vec![format!("{}a", PROBE), format!("{}b", PROBE)]
        );
        assert_eq!(bridge.mirror().group("r", "g").unwrap().playing, PlayingState::Playing);
    }

    #[tokio::test]
    async fn test_probe_nothing_playing() {
        let transport = ScriptedTransport::new();
        let bridge = bridge_with_group(&transport, &["a", "b"]).await;
        transport.respond(&format!("{}a", PROBE), json!(false));
        transport.respond_raw(&format!("{}b", PROBE), "nope");

        assert!(!bridge.probe("r", "g").await.unwrap());
        assert_eq!(transport.paths_with(PROBE).len(), 2);
        assert_eq!(bridge.mirror().group("r", "g").unwrap().playing, PlayingState::Stopped);
    }

    #[tokio::test]
    async fn test_probe_group_without_timelines() {
        let transport = ScriptedTransport::new();
        let bridge = bridge_with_group(&transport, &[]).await;

        assert!(!bridge.probe("r", "g").await.unwrap());
        assert!(transport.calls().is_empty());
        assert_eq!(bridge.mirror().group("r", "g").unwrap().playing, PlayingState::Stopped);
    }

    #[tokio::test]
    async fn test_probe_unknown_group_makes_no_request() {
        let transport = ScriptedTransport::new();
        let bridge = bridge_with_group(&transport, &["a"]).await;

        assert!(!bridge.probe("missing", "g").await.unwrap());
        assert!(!bridge.probe("r", "missing").await.unwrap());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_probe_failure_keeps_cached_flag() {
        let transport = ScriptedTransport::new();
        let bridge = bridge_with_group(&transport, &["a"]).await;
        transport.fail(&format!("{}a", PROBE));

        let err = bridge.probe("r", "g").await.unwrap_err();
        assert!(matches!(err, BridgeError::Transport { .. }));
        assert_eq!(bridge.mirror().group("r", "g").unwrap().playing, PlayingState::Unknown);
    }
}
