//! In-memory transport and host used by the unit tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::client::{Method, ResponseBody, Transport};
use crate::error::{BridgeError, Result};
use crate::host::{ConnectionStatus, PanelHost};
use crate::surface::{ActionDefinition, FeedbackDefinition, PresetDefinition};

#[derive(Debug, Clone)]
enum Scripted {
    Respond(ResponseBody),
    Fail,
}

/// Transport answering from a path → response table
///
/// Unscripted paths answer JSON `null`. Every request is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, Scripted>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<(Method, String)>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Scripted::Respond(ResponseBody::Json(value)));
    }

    pub fn respond_raw(&self, path: &str, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Scripted::Respond(ResponseBody::Raw(text.to_string())));
    }

    pub fn fail(&self, path: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), Scripted::Fail);
    }

    /// Requests to `path` wait until the returned handle is notified
    pub fn hold(&self, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap()
            .insert(path.to_string(), notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded paths that start with `prefix`
    pub fn paths_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(_, path)| path)
            .filter(|path| path.starts_with(prefix))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(&self, method: Method, path: &str, _body: Option<&Value>) -> Result<ResponseBody> {
        self.calls.lock().unwrap().push((method, path.to_string()));

        let hold = self.holds.lock().unwrap().get(path).cloned();
        if let Some(notify) = hold {
            notify.notified().await;
        }

        let scripted = self.responses.lock().unwrap().get(path).cloned();
        match scripted {
            Some(Scripted::Respond(body)) => Ok(body),
            Some(Scripted::Fail) => Err(BridgeError::transport(path, "connection refused")),
            None => Ok(ResponseBody::Json(Value::Null)),
        }
    }
}

/// Host that records everything the bridge tells it
#[derive(Default)]
pub struct RecordingHost {
    statuses: Mutex<Vec<ConnectionStatus>>,
    actions: Mutex<Vec<ActionDefinition>>,
    feedbacks: Mutex<Vec<FeedbackDefinition>>,
    presets: Mutex<Vec<PresetDefinition>>,
    checked: Mutex<Vec<String>>,
    publishes: Mutex<usize>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn statuses(&self) -> Vec<ConnectionStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn last_status(&self) -> Option<ConnectionStatus> {
        self.statuses.lock().unwrap().last().copied()
    }

    pub fn actions(&self) -> Vec<ActionDefinition> {
        self.actions.lock().unwrap().clone()
    }

    pub fn feedbacks(&self) -> Vec<FeedbackDefinition> {
        self.feedbacks.lock().unwrap().clone()
    }

    pub fn presets(&self) -> Vec<PresetDefinition> {
        self.presets.lock().unwrap().clone()
    }

    /// Number of times preset definitions were pushed
    pub fn publishes(&self) -> usize {
        *self.publishes.lock().unwrap()
    }

    pub fn checked(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }
}

impl PanelHost for RecordingHost {
    fn update_status(&self, status: ConnectionStatus, _message: Option<&str>) {
        self.statuses.lock().unwrap().push(status);
    }

    fn set_action_definitions(&self, actions: &[ActionDefinition]) {
        *self.actions.lock().unwrap() = actions.to_vec();
    }

    fn set_feedback_definitions(&self, feedbacks: &[FeedbackDefinition]) {
        *self.feedbacks.lock().unwrap() = feedbacks.to_vec();
    }

    fn set_preset_definitions(&self, presets: &[PresetDefinition]) {
        *self.presets.lock().unwrap() = presets.to_vec();
        *self.publishes.lock().unwrap() += 1;
    }

    fn check_feedbacks_by_id(&self, feedback_ids: &[String]) {
        self.checked.lock().unwrap().extend_from_slice(feedback_ids);
    }
}
