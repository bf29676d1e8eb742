//! HTTP transport used by the remote client
//!
//! The transport only knows how to send a request and hand back the body.
//! Everything endpoint-specific lives in [`super::RemoteClient`].

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{BridgeError, Result};

/// HTTP method used against the internal API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Body returned by SuperConductor
///
/// Bodies are parsed as JSON when possible and kept as raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Raw(String),
}

impl ResponseBody {
    pub fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Raw(text),
        }
    }

    /// Literal `true` only; anything else reads as false
    pub fn is_true(&self) -> bool {
        match self {
            ResponseBody::Json(Value::Bool(b)) => *b,
            ResponseBody::Raw(text) => text.trim() == "true",
            _ => false,
        }
    }
}

/// Sends requests to the internal API
///
/// `path` is relative to the API root and already carries its query string.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ResponseBody>;
}

/// reqwest-backed transport talking to `http://<host>:<port>/api/internal`
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(host: &str, port: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url(host, port),
        }
    }
}

pub fn base_url(host: &str, port: &str) -> String {
    format!("http://{}:{}/api/internal", host, port)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ResponseBody> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method.as_str(), url);

        let mut request = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .header("Content-Type", "application/json");

        // GET never carries a body
        if let (Some(body), Method::Post) = (body, method) {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BridgeError::transport(&url, e.to_string()))?
            .error_for_status()
            .map_err(|e| BridgeError::transport(&url, e.to_string()))?;

        let text = response
            .text()
            .await
            .map_err(|e| BridgeError::transport(&url, e.to_string()))?;

        Ok(ResponseBody::parse(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_falls_back_to_raw_text() {
        assert_eq!(
            ResponseBody::parse("{\"a\":1}".to_string()),
            ResponseBody::Json(serde_json::json!({"a": 1}))
        );
        assert_eq!(
            ResponseBody::parse("not json".to_string()),
            ResponseBody::Raw("not json".to_string())
        );
    }

    #[test]
    fn test_only_literal_true_is_playing() {
        assert!(ResponseBody::parse("true".to_string()).is_true());
        assert!(ResponseBody::Raw(" true\n".to_string()).is_true());
        assert!(!ResponseBody::parse("false".to_string()).is_true());
        assert!(!ResponseBody::parse("\"true\"".to_string()).is_true());
        assert!(!ResponseBody::parse("1".to_string()).is_true());
        assert!(!ResponseBody::Raw(String::new()).is_true());
    }

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("10.0.0.5", "5500"), "http://10.0.0.5:5500/api/internal");
    }
}
