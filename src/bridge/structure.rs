//! Structural refresh: rundown list → groups → mirror → surface

use futures::future::join_all;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::client::RemoteClient;
use crate::error::BridgeError;
use crate::model::{Group, StructureSnapshot};
use crate::surface::Surface;

use super::Bridge;

impl Bridge {
    /// Re-fetch every rundown and its groups, then rebuild the panel surface
    ///
    /// Never fails: transport errors are reported to the host and the next
    /// tick tries again. Overlapping refreshes are allowed; whichever
    /// completes last wins.
    pub async fn refresh_structure(&self) {
        let client = self.client();

        let rundown_ids = match client.list_rundowns().await {
            Ok(ids) => {
                self.report_ok();
                ids
            }
            Err(err @ BridgeError::MalformedResponse { .. }) => {
                // SuperConductor answered, so connectivity is back
                self.report_ok();
                warn!("Unexpected rundown list, treating as empty: {}", err);
                Vec::new()
            }
            Err(err) => {
                if self.is_shut_down() {
                    return;
                }
                self.report_failure("Error fetching rundowns", &err);
                self.mirror_mut().forget_rundown_ids();
                return;
            }
        };

        if rundown_ids.is_empty() {
            if self.is_shut_down() {
                return;
            }
            warn!("No rundowns found.");
            let surface = {
                let mut mirror = self.mirror_mut();
                mirror.clear();
                Surface::build(mirror.combined_groups())
            };
            self.host().publish_surface(&surface);
            return;
        }

        let groups = self.fetch_all_groups(&client, &rundown_ids).await;

        if self.is_shut_down() {
            debug!("Bridge shut down during refresh, discarding {} rundowns", rundown_ids.len());
            return;
        }

        let snapshot = StructureSnapshot { rundown_ids, groups };
        let surface = {
            let mut mirror = self.mirror_mut();
            Surface::build(mirror.apply(snapshot))
        };
        info!(
            "Mirrored {} rundowns with {} groups",
            self.mirror().rundown_ids().len(),
            surface.presets.len()
        );
        self.host().publish_surface(&surface);
    }

    /// Fetch the groups of every rundown concurrently
    ///
    /// A rundown whose fetch fails contributes no groups; the others are
    /// unaffected.
    async fn fetch_all_groups(
        &self,
        client: &RemoteClient,
        rundown_ids: &[String],
    ) -> HashMap<String, Vec<Group>> {
        let fetches = rundown_ids.iter().map(|rundown_id| async move {
            let groups = match client.fetch_groups(rundown_id).await {
                Ok(groups) => groups.into_iter().map(Group::from).collect(),
                Err(err) => {
                    self.report_failure(
                        &format!("Error fetching groups for rundown {}", rundown_id),
                        &err,
                    );
                    Vec::new()
                }
            };
            (rundown_id.clone(), groups)
        });

        join_all(fetches).await.into_iter().collect()
    }
}
