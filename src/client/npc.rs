use std::sync::Weak;

use super::session::SessionState;
use super::transport::backend_failure;
use super::wire::{ActionRequest, NpcInfo};
use super::{to_body, Method, NpcClient};
use crate::context::ActInput;
use crate::error::Result;
use crate::response::ActionResult;

/// Handle to an NPC registered on the backend.
#[derive(Debug, Clone)]
pub struct Npc {
    client: NpcClient,
    npc_id: String,
    name: String,
    background: String,
    session: Weak<SessionState>,
}

impl Npc {
    pub(crate) fn new(
        client: NpcClient,
        npc_id: String,
        name: String,
        background: String,
        session: Weak<SessionState>,
    ) -> Self {
        Self {
            client,
            npc_id,
            name,
            background,
            session,
        }
    }

    pub fn id(&self) -> &str {
        &self.npc_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    /// Session id to attach, if the owning session is alive and registered.
    fn registered_session_id(&self) -> Option<String> {
        self.session
            .upgrade()
            .filter(|state| state.tools_registered())
            .map(|state| state.session_id.clone())
    }

    /// Run one action tick.
    ///
    /// Never fails: bad input, an unreachable backend, a non-2xx status or an
    /// unreadable body all come back as `success == false` with `error` set.
    pub async fn act(&self, input: impl Into<ActInput>) -> ActionResult {
        match self.try_act(input.into()).await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(npc_id = %self.npc_id, "NPC action failed: {error}");
                ActionResult::failure(error.to_string())
            }
        }
    }

    async fn try_act(&self, input: ActInput) -> Result<ActionResult> {
        let body = to_body(&ActionRequest {
            npc_id: &self.npc_id,
            context: input.normalize()?,
            session_id: self.registered_session_id(),
        })?;
        let response = self.client.send(Method::Post, &["npc", "act"], Some(body)).await?;
        if !response.is_success() {
            return Err(backend_failure(&response));
        }
        ActionResult::from_json(&response.body)
    }

    /// Current backend record for this NPC.
    pub async fn info(&self) -> Result<NpcInfo> {
        self.client.get_npc(&self.npc_id).await
    }

    /// Remove the NPC from the backend, consuming the handle.
    pub async fn delete(self) -> Result<()> {
        self.client.delete_npc(&self.npc_id).await
    }
}
