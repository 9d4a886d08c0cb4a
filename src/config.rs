use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::SessionError;

/// Settings for the production `reqwest` session.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "user_agent": "netlayer/0.1",
///   "default_headers": { "Accept": "image/*" },
///   "gzip": true
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user_agent: Option<String>,
    pub default_headers: HashMap<String, String>,
    pub gzip: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            default_headers: HashMap::new(),
            gzip: true,
        }
    }
}

impl SessionConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session config '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("invalid session config '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Defaults, with the user agent taken from `NETLAYER_USER_AGENT` if set.
    pub fn from_env() -> Self {
        Self {
            user_agent: std::env::var("NETLAYER_USER_AGENT").ok(),
            ..Self::default()
        }
    }

    pub fn header_map(&self) -> Result<HeaderMap, SessionError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|source| {
                SessionError::InvalidHeaderName {
                    name: name.clone(),
                    source,
                }
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|source| {
                SessionError::InvalidHeaderValue {
                    name: name.clone(),
                    source,
                }
            })?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }

    pub fn build_client(&self) -> Result<reqwest::Client, SessionError> {
        let mut builder = reqwest::Client::builder()
            .default_headers(self.header_map()?)
            .gzip(self.gzip);
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        Ok(builder.build()?)
    }
}
