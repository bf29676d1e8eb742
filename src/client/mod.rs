//! Typed client for the SuperConductor internal API
//!
//! Each endpoint validates the response shape here, so callers only ever see
//! typed results or a [`BridgeError`].

mod transport;

pub use transport::{base_url, HttpTransport, Method, ResponseBody, Transport};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};

/// `GET /rundowns`
#[derive(Debug, Deserialize)]
struct RundownListResponse {
    #[serde(rename = "rundownIds")]
    rundown_ids: Vec<String>,
}

/// `GET /rundown/?rundownId=..`
#[derive(Debug, Deserialize)]
struct RundownResponse {
    rundown: RundownBody,
}

#[derive(Debug, Deserialize)]
struct RundownBody {
    // Decoded one by one so a bad group cannot hide its siblings
    groups: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct GroupBody {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    parts: Option<Vec<PartBody>>,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    #[serde(default)]
    timeline: Option<Vec<TimelineEntry>>,
}

#[derive(Debug, Deserialize)]
struct TimelineEntry {
    #[serde(default)]
    obj: Option<TimelineObj>,
}

#[derive(Debug, Deserialize)]
struct TimelineObj {
    // Anything but a string counts as absent
    #[serde(default)]
    id: Option<Value>,
}

/// A group as reported by SuperConductor, with its timeline object ids flattened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteGroup {
    pub id: String,
    pub name: String,
    pub timelines: Vec<String>,
}

impl From<GroupBody> for RemoteGroup {
    fn from(group: GroupBody) -> Self {
        let timelines = group
            .parts
            .unwrap_or_default()
            .into_iter()
            .flat_map(|part| part.timeline.unwrap_or_default())
            .filter_map(|entry| match entry.obj?.id? {
                Value::String(id) if !id.is_empty() => Some(id),
                _ => None,
            })
            .collect();

        Self {
            // Unnamed groups are labelled with their id
            name: group.name.unwrap_or_else(|| group.id.clone()),
            id: group.id,
            timelines,
        }
    }
}

/// Group-level operations exposed as commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOperation {
    Play,
    Stop,
    Pause,
}

impl GroupOperation {
    fn endpoint(&self) -> &'static str {
        match self {
            GroupOperation::Play => "/playGroup/",
            GroupOperation::Stop => "/stopGroup/",
            GroupOperation::Pause => "/pauseGroup/",
        }
    }
}

/// Client for the internal API
///
/// Cheap to clone; the transport is shared.
#[derive(Clone)]
pub struct RemoteClient {
    transport: Arc<dyn Transport>,
}

impl RemoteClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Client talking HTTP to `host:port`
    pub fn http(host: &str, port: &str) -> Self {
        Self::new(Arc::new(HttpTransport::new(host, port)))
    }

    /// List the ids of all rundowns
    pub async fn list_rundowns(&self) -> Result<Vec<String>> {
        let path = "/rundowns";
        let body = self.transport.request(Method::Get, path, None).await?;
        let response: RundownListResponse = decode(path, body)?;
        Ok(response.rundown_ids)
    }

    /// Fetch the groups of one rundown
    pub async fn fetch_groups(&self, rundown_id: &str) -> Result<Vec<RemoteGroup>> {
        let path = format!("/rundown/?rundownId={}", urlencoding::encode(rundown_id));
        let body = self.transport.request(Method::Get, &path, None).await?;
        let response: RundownResponse = decode(&path, body)?;
        debug!(
            "Fetched groups for rundown ID {}: {} items",
            rundown_id,
            response.rundown.groups.len()
        );

        let groups = response
            .rundown
            .groups
            .into_iter()
            .enumerate()
            .filter_map(|(index, group)| match serde_json::from_value::<GroupBody>(group) {
                Ok(group) => Some(RemoteGroup::from(group)),
                Err(e) => {
                    warn!("Skipping group #{} of rundown {}: {}", index, rundown_id, e);
                    None
                }
            })
            .collect();
        Ok(groups)
    }

    /// Play, stop or pause a group
    pub async fn group_operation(
        &self,
        operation: GroupOperation,
        rundown_id: &str,
        group_id: &str,
    ) -> Result<()> {
        let path = format!(
            "{}?rundownId={}&groupId={}",
            operation.endpoint(),
            urlencoding::encode(rundown_id),
            urlencoding::encode(group_id)
        );
        self.transport.request(Method::Post, &path, None).await?;
        Ok(())
    }

    /// Whether a single timeline object is currently playing
    pub async fn is_timeline_obj_playing(&self, rundown_id: &str, timeline_obj_id: &str) -> Result<bool> {
        let path = format!(
            "/isTimelineObjPlaying/?rundownId={}&timelineObjId={}",
            urlencoding::encode(rundown_id),
            urlencoding::encode(timeline_obj_id)
        );
        let body = self.transport.request(Method::Post, &path, None).await?;
        Ok(body.is_true())
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: ResponseBody) -> Result<T> {
    match body {
        ResponseBody::Json(value) => {
            serde_json::from_value(value).map_err(|e| BridgeError::malformed(endpoint, e.to_string()))
        }
        ResponseBody::Raw(text) => Err(BridgeError::malformed(
            endpoint,
            format!("expected JSON, got {:?}", truncate(&text, 64)),
        )),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
