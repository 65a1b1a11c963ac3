//! The closed set of state actions and the pure reducer
//!
//! `reduce` is total: every action applies to every state. Actions that
//! address an unknown document or agent leave the state unchanged.

use crate::entities::{ActivityEvent, AppState, Document, User};
use crate::patch::{AgentPatch, DocumentPatch, SettingsPatch, UserPatch, ZkProofPatch};
use crate::types::{AgentId, DocumentId};
use serde::{Deserialize, Serialize};

/// Every way the application state can change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    AddDocument(Document),
    UpdateDocument {
        id: DocumentId,
        patch: DocumentPatch,
    },
    DeleteDocument(DocumentId),
    AddActivity(ActivityEvent),
    UpdateSettings(SettingsPatch),
    UpdateAgent {
        id: AgentId,
        patch: AgentPatch,
    },
    UpdateZkProof(ZkProofPatch),
    SetHasLaunched(bool),
    Login(User),
    Logout,
    UpdateUser(UserPatch),
}

impl Action {
    /// Stable name for logging
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Action::AddDocument(_) => "add_document",
            Action::UpdateDocument { .. } => "update_document",
            Action::DeleteDocument(_) => "delete_document",
            Action::AddActivity(_) => "add_activity",
            Action::UpdateSettings(_) => "update_settings",
            Action::UpdateAgent { .. } => "update_agent",
            Action::UpdateZkProof(_) => "update_zk_proof",
            Action::SetHasLaunched(_) => "set_has_launched",
            Action::Login(_) => "login",
            Action::Logout => "logout",
            Action::UpdateUser(_) => "update_user",
        }
    }
}

/// Apply `action` to `state`, producing the next state
#[must_use]
pub fn reduce(mut state: AppState, action: &Action) -> AppState {
    match action {
        Action::AddDocument(doc) => {
            let mut doc = doc.clone();
            doc.expired = false;
            state.documents.push(doc);
        }
        Action::UpdateDocument { id, patch } => {
            if let Some(doc) = state.documents.iter_mut().find(|d| d.id == *id) {
                patch.apply(doc);
            }
        }
        Action::DeleteDocument(id) => {
            state.documents.retain(|d| d.id != *id);
        }
        Action::AddActivity(event) => {
            state.activities.push_front(event.clone());
            state.activities.truncate(state.activity_capacity);
        }
        Action::UpdateSettings(patch) => patch.apply(&mut state.settings),
        Action::UpdateAgent { id, patch } => {
            if let Some(agent) = state.agents.iter_mut().find(|a| a.id == *id) {
                patch.apply(agent);
            }
        }
        Action::UpdateZkProof(patch) => patch.apply(&mut state.zk_proof),
        Action::SetHasLaunched(launched) => state.has_launched = *launched,
        Action::Login(user) => {
            state.is_authenticated = true;
            state.user = Some(user.clone());
        }
        Action::Logout => {
            state.is_authenticated = false;
            state.user = None;
        }
        Action::UpdateUser(patch) => {
            state.user = state.user.as_ref().map(|u| patch.merged(u));
        }
    }
    state
}
