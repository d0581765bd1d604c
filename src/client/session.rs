use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::npc::Npc;
use super::wire::{RegisterNpcRequest, RegisterNpcResponse, RegisterToolsRequest, ToolRegistration};
use super::{decode, to_body, Method, NpcClient};
use crate::error::{NpcError, Result};
use crate::tools::{descriptors_for, ensure_unique_names, Callable, ToolDescriptor};

/// Identity and registration state shared between a session and its NPCs.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) session_id: String,
    tools_registered: AtomicBool,
}

impl SessionState {
    pub(crate) fn tools_registered(&self) -> bool {
        self.tools_registered.load(Ordering::Acquire)
    }
}

/// A tool-registration scope on the backend.
///
/// Dropping a session sends nothing. NPCs created from it stop attaching the
/// session id once it is gone.
#[derive(Debug)]
pub struct Session {
    client: NpcClient,
    state: Arc<SessionState>,
}

impl Session {
    pub(crate) fn new(client: NpcClient, session_id: String) -> Self {
        Self {
            client,
            state: Arc::new(SessionState {
                session_id,
                tools_registered: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.state.session_id
    }

    /// Whether a registration round-trip has succeeded for this session.
    pub fn tools_registered(&self) -> bool {
        self.state.tools_registered()
    }

    pub fn client(&self) -> &NpcClient {
        &self.client
    }

    /// Register marked callables as this session's tools.
    ///
    /// Unmarked callables and duplicate names are rejected before any request
    /// is made. Registering again re-sends the full set.
    pub async fn register_tools(&self, callables: &[Callable]) -> Result<ToolRegistration> {
        let descriptors = descriptors_for(callables)?;
        self.register(&descriptors).await
    }

    /// Register descriptors built by hand.
    pub async fn register_descriptors(
        &self,
        descriptors: Vec<ToolDescriptor>,
    ) -> Result<ToolRegistration> {
        ensure_unique_names(&descriptors)?;
        self.register(&descriptors).await
    }

    async fn register(&self, descriptors: &[ToolDescriptor]) -> Result<ToolRegistration> {
        let body = to_body(&RegisterToolsRequest {
            session_id: self.id(),
            tools: descriptors,
        })?;
        let response = self
            .client
            .expect_success(Method::Post, &["tools", "register"], Some(body))
            .await?;

        self.state.tools_registered.store(true, Ordering::Release);

        let registration = decode::<ToolRegistration>(&response).unwrap_or_else(|error| {
            tracing::warn!("Unreadable tool registration reply, assuming sent set: {error}");
            ToolRegistration::assumed(self.id(), descriptors)
        });
        tracing::info!(
            session_id = self.id(),
            tools_count = registration.tools_count,
            "Tools registered"
        );
        Ok(registration)
    }

    /// Create an NPC on the backend and return a handle bound to this session.
    pub async fn create_npc(&self, name: &str, background: &str) -> Result<Npc> {
        let body = to_body(&RegisterNpcRequest {
            name,
            background_story: background,
        })?;
        let response = self
            .client
            .expect_success(Method::Post, &["npc", "register"], Some(body))
            .await?;

        let npc_id = decode::<RegisterNpcResponse>(&response)
            .ok()
            .and_then(|reply| reply.npc_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or(NpcError::MissingIdentifier)?;

        tracing::info!(npc_id = %npc_id, name, "NPC created");
        Ok(self.attach_npc(npc_id, name, background))
    }

    /// Handle for an NPC that already exists on the backend. Nothing is sent.
    pub fn attach_npc(
        &self,
        npc_id: impl Into<String>,
        name: impl Into<String>,
        background: impl Into<String>,
    ) -> Npc {
        Npc::new(
            self.client.clone(),
            npc_id.into(),
            name.into(),
            background.into(),
            Arc::downgrade(&self.state),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::testing::RecordingTransport;
    use crate::tools::{Param, ParamType};
    use serde_json::json;

    fn session() -> (Arc<RecordingTransport>, Session) {
        let transport = Arc::new(RecordingTransport::new());
        let client = NpcClient::with_transport("http://npc.test", transport.clone());
        (transport, client.session("tavern"))
    }

    fn speak() -> Callable {
        Callable::new("speak")
            .doc("Make the NPC say something.\n\nArgs:\n    message: What to say\n")
            .param(Param::new("self"))
            .param(Param::new("message").typed("str"))
            .param(Param::new("target").typed("str").with_default())
            .tool()
    }

    #[tokio::test]
    async fn unmarked_callable_is_rejected_without_network() {
        let (transport, session) = session();
        let plain = Callable::new("wave");
        let err = session
            .register_tools(&[speak(), plain])
            .await
            .unwrap_err();
        assert_eq!(err, NpcError::ToolNotDecorated { name: "wave".into() });
        assert!(transport.requests().is_empty());
        assert!(!session.tools_registered());
    }

    #[tokio::test]
    async fn duplicate_descriptors_are_rejected_without_network() {
        let (transport, session) = session();
        let a = ToolDescriptor::builder("wave").build();
        let err = session
            .register_descriptors(vec![a.clone(), a])
            .await
            .unwrap_err();
        assert_eq!(err, NpcError::DuplicateTool { name: "wave".into() });
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn registration_posts_session_and_tools() {
        let (transport, session) = session();
        transport.reply_json(
            201,
            json!({
                "session_id": "tavern",
                "tools_count": 1,
                "tool_names": ["speak"],
                "success": true,
                "message": "Tools registered successfully"
            }),
        );

        let registration = session.register_tools(&[speak()]).await.unwrap();
        assert_eq!(registration.tools_count, 1);
        assert!(session.tools_registered());

        let request = &transport.requests()[0];
        assert_eq!(request.url, "http://npc.test/tools/register");
        assert_eq!(request.method, Method::Post);
        assert_eq!(
            transport.last_body(),
            json!({
                "session_id": "tavern",
                "tools": [{
                    "name": "speak",
                    "description": "Make the NPC say something.",
                    "parameters": {
                        "message": {"type": "string", "description": "What to say", "required": true},
                        "target": {"type": "string", "description": "Parameter: target", "required": false}
                    }
                }]
            })
        );
    }

    #[tokio::test]
    async fn failed_registration_leaves_flag_unset() {
        let (transport, session) = session();
        transport.reply_json(400, json!({"error": "Session ID is required", "code": "VALIDATION_ERROR"}));
        let err = session.register_tools(&[speak()]).await.unwrap_err();
        assert!(matches!(err, NpcError::BackendFailure { status: 400, .. }));
        assert!(!session.tools_registered());
    }

    #[tokio::test]
    async fn unreadable_ack_falls_back_to_sent_set() {
        let (transport, session) = session();
        transport.reply(201, "created");
        let descriptor = ToolDescriptor::builder("give_item")
            .param("item", ParamType::String, "", true)
            .build();
        let registration = session.register_descriptors(vec![descriptor]).await.unwrap();
        assert_eq!(registration.session_id, "tavern");
        assert_eq!(registration.tool_names, vec!["give_item"]);
        assert!(session.tools_registered());
    }

    #[tokio::test]
    async fn reregistration_resends_full_set() {
        let (transport, session) = session();
        transport.reply(201, "{}").reply(201, "{}");
        session.register_tools(&[speak()]).await.unwrap();
        session.register_tools(&[speak()]).await.unwrap();
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].body, requests[1].body);
        assert!(session.tools_registered());
    }

    #[tokio::test]
    async fn create_npc_returns_bound_handle() {
        let (transport, session) = session();
        transport.reply_json(200, json!({"npc_id": "npc-42", "success": true, "message": "ok"}));
        let npc = session.create_npc("Elara", "Innkeeper").await.unwrap();
        assert_eq!(npc.id(), "npc-42");
        assert_eq!(npc.name(), "Elara");
        assert_eq!(npc.background(), "Innkeeper");
        assert_eq!(
            transport.last_body(),
            json!({"name": "Elara", "background_story": "Innkeeper"})
        );
    }

    #[tokio::test]
    async fn create_npc_without_id_is_missing_identifier() {
        let (transport, session) = session();
        transport
            .reply_json(200, json!({"success": true}))
            .reply_json(200, json!({"npc_id": ""}))
            .reply(200, "not json");
        for _ in 0..3 {
            assert_eq!(
                session.create_npc("Elara", "Innkeeper").await.unwrap_err(),
                NpcError::MissingIdentifier
            );
        }
    }

    #[tokio::test]
    async fn attached_npc_shares_session_state() {
        let (transport, session) = session();
        let npc = session.attach_npc("npc-7", "Bram", "Smith");
        assert!(transport.requests().is_empty());

        transport.reply(201, "{}");
        session.register_tools(&[speak()]).await.unwrap();
        transport.reply(200, r#"{"success": true}"#);
        npc.act(crate::context::ActInput::new(["Forge"])).await;
        assert_eq!(transport.last_body()["session_id"], "tavern");
        assert_eq!(transport.last_body()["npc_id"], "npc-7");
    }

    #[tokio::test]
    async fn create_npc_propagates_backend_failure() {
        let (transport, session) = session();
        transport.reply(500, "boom");
        assert!(matches!(
            session.create_npc("Elara", "Innkeeper").await,
            Err(NpcError::BackendFailure { status: 500, .. })
        ));
    }
}
