//! Backend client: sessions, NPC handles and the HTTP calls behind them.
//!
//! [`NpcClient`] is a cheap, cloneable handle over one backend. Tool
//! registration is scoped to a [`Session`]; NPCs created through a session
//! attach its id to action requests once its tools are registered.

pub mod npc;
pub mod session;
pub mod transport;
pub mod wire;

pub use npc::Npc;
pub use session::Session;
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
pub use wire::{NpcInfo, NpcListing, SessionTools, ToolRegistration};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{NpcError, Result};
use transport::backend_failure;
use wire::NpcLookup;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

const HEALTH_REPLY: &str = "pong";

#[derive(Clone)]
pub struct NpcClient {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for NpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NpcClient")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl NpcClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(base_url, Arc::new(ReqwestTransport::new()))
    }

    /// Client configured from the `[http]` section and `base_url` of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::with_transport(
            &config.base_url,
            Arc::new(ReqwestTransport::from_config(&config.http)),
        )
    }

    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `true` only if the backend answers `GET /health` with exactly `pong`.
    pub async fn health_check(&self) -> bool {
        match self.send(Method::Get, &["health"], None).await {
            Ok(response) => response.is_success() && response.body == HEALTH_REPLY,
            Err(error) => {
                tracing::debug!("Health check failed: {error}");
                false
            }
        }
    }

    /// Open a tool session with a caller-chosen id. Nothing is sent until
    /// tools are registered.
    pub fn session(&self, session_id: impl Into<String>) -> Session {
        Session::new(self.clone(), session_id.into())
    }

    pub fn session_with_random_id(&self) -> Session {
        self.session(uuid::Uuid::new_v4().to_string())
    }

    pub async fn list_npcs(&self) -> Result<NpcListing> {
        let response = self.expect_success(Method::Get, &["npc", "list"], None).await?;
        decode(&response)
    }

    pub async fn get_npc(&self, npc_id: &str) -> Result<NpcInfo> {
        let response = self.send(Method::Get, &["npc", npc_id], None).await?;
        if response.status == 404 {
            return Err(NpcError::NpcNotFound(npc_id.to_string()));
        }
        if !response.is_success() {
            return Err(backend_failure(&response));
        }
        decode::<NpcLookup>(&response).map(|lookup| lookup.npc)
    }

    pub async fn delete_npc(&self, npc_id: &str) -> Result<()> {
        self.expect_success(Method::Delete, &["npc", npc_id], None)
            .await?;
        tracing::info!(npc_id, "NPC deleted");
        Ok(())
    }

    /// Tools the backend holds for `session_id`.
    pub async fn session_tools(&self, session_id: &str) -> Result<SessionTools> {
        let response = self
            .send(Method::Get, &["tools", "session", session_id], None)
            .await?;
        if response.status == 404 {
            return Err(NpcError::SessionNotFound(session_id.to_string()));
        }
        if !response.is_success() {
            return Err(backend_failure(&response));
        }
        decode(&response)
    }

    /// Resolve path segments against the base URL. Each segment is
    /// percent-encoded on its own, so ids cannot change the route.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || matches!(**s, "." | ".."))
        {
            return Err(NpcError::InvalidRequest(format!(
                "path segment {bad:?} is not a usable id"
            )));
        }

        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            NpcError::InvalidRequest(format!("base URL {:?} is invalid: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                NpcError::InvalidRequest(format!("base URL {:?} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        tracing::debug!(method = method.as_str(), path = %path, "Sending backend request");
        let response = self
            .transport
            .send(HttpRequest {
                method,
                url: url.into(),
                body,
            })
            .await?;
        tracing::debug!(status = response.status, path = %path, "Backend responded");
        Ok(response)
    }

    /// Send, and turn any non-2xx answer into [`NpcError::BackendFailure`].
    pub(crate) async fn expect_success(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<serde_json::Value>,
    ) -> Result<HttpResponse> {
        let response = self.send(method, segments, body).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(backend_failure(&response))
        }
    }
}

pub(crate) fn to_body(payload: &impl Serialize) -> Result<serde_json::Value> {
    serde_json::to_value(payload)
        .map_err(|e| NpcError::InvalidRequest(format!("failed to encode request body: {e}")))
}

pub(crate) fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_str(&response.body)
        .map_err(|e| NpcError::MalformedResponse(format!("invalid JSON: {e}")))
}
