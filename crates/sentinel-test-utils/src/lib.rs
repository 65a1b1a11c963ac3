//! Testing utilities for the Sentinel workspace
//!
//! Shared fixtures and assertions over the state model.

#![allow(missing_docs)]

use chrono::Utc;
use sentinel_state::{Action, AppState, Document, DocumentId, StateChange, Store, User, UserId};
use sha2::{Digest, Sha256};

/// Pending document with content-derived size and hash
pub fn sample_document(filename: &str, content: &[u8]) -> Document {
    let kind = sentinel_state::file_extension(filename).unwrap_or_else(|| "TXT".to_string());
    Document::new(
        filename,
        kind,
        content.len() as u64,
        hex::encode(Sha256::digest(content)),
        Utc::now(),
    )
}

pub fn sample_user(identifier: &str) -> User {
    User::from_identifier(UserId::new("user-1"), identifier, Utc::now())
}

pub fn fresh_store() -> Store {
    Store::new(AppState::default())
}

/// Store holding `count` sample documents, plus their ids in insertion order
pub fn store_with_documents(count: usize) -> (Store, Vec<DocumentId>) {
    let store = fresh_store();
    let ids = (0..count)
        .map(|i| {
            let doc = sample_document(&format!("doc-{i}.pdf"), format!("content {i}").as_bytes());
            let id = doc.id;
            store.dispatch(Action::AddDocument(doc));
            id
        })
        .collect();
    (store, ids)
}

/// Action kinds of the given changes, in order
pub fn action_kinds<'a>(changes: impl IntoIterator<Item = &'a StateChange>) -> Vec<&'static str> {
    changes.into_iter().map(|c| c.action.kind()).collect()
}

/// Titles of the activity log, newest first
pub fn activity_titles(state: &AppState) -> Vec<&str> {
    state.activities.iter().map(|a| a.title.as_str()).collect()
}

/// Assert that `earlier` was emitted before `later` (log is newest first)
///
/// # Panics
/// If either title is missing or they are out of order.
pub fn assert_emitted_before(state: &AppState, earlier: &str, later: &str) {
    let titles = activity_titles(state);
    let position = |title: &str| {
        titles
            .iter()
            .position(|t| *t == title)
            .unwrap_or_else(|| panic!("activity {title:?} not found in {titles:?}"))
    };
    assert!(
        position(later) < position(earlier),
        "expected {earlier:?} before {later:?}; log: {titles:?}"
    );
}
