//! Core data types shared between the focus machinery, the cards, and the
//! embedding data layer.
//!
//! The crate never owns feed items; it reads the fields it needs and pushes
//! read-state changes back through the [`MarkReadSink`] command sink.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Identifier of an independently scrolling column.
///
/// Columns partition the feed nominally only; item focus stays globally
/// unique across every column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnId(String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The slice of an item the card layer reads. Owned by the data layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub link: String,
    pub read: bool,
    pub saved: bool,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
            link: link.into(),
            read: false,
            saved: false,
        }
    }

    pub fn read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    pub fn saved(mut self, saved: bool) -> Self {
        self.saved = saved;
        self
    }
}

/// Ephemeral event published when an item becomes focused by local input.
///
/// Claims have no lifecycle beyond the broadcast call; subscribers compare
/// the identity against their own and drop focus when it differs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FocusClaim {
    pub column_id: ColumnId,
    pub item_id: ItemId,
}

impl FocusClaim {
    pub fn new(column_id: ColumnId, item_id: ItemId) -> Self {
        Self { column_id, item_id }
    }

    pub fn matches(&self, column_id: &ColumnId, item_id: &ItemId) -> bool {
        &self.column_id == column_id && &self.item_id == item_id
    }
}

/// Command accepted by the data layer's read-state sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkReadRequest {
    pub item_ids: Vec<ItemId>,
    pub unread: bool,
    pub local_only: bool,
}

impl MarkReadRequest {
    /// The request issued by the deferred read marker: mark one item read,
    /// locally, with no immediate server round trip.
    pub fn local_read(item_id: ItemId) -> Self {
        Self {
            item_ids: vec![item_id],
            unread: false,
            local_only: true,
        }
    }
}

/// Sink for read-state commands. Implemented by the embedding data layer;
/// failures of the underlying persistence write are not observed here.
pub trait MarkReadSink: Send + Sync {
    fn mark_read(&self, request: MarkReadRequest);
}

/// Sink that drops every request. Useful as a placeholder wiring default.
#[derive(Debug, Default)]
pub struct NullMarkReadSink;

impl MarkReadSink for NullMarkReadSink {
    fn mark_read(&self, _request: MarkReadRequest) {}
}

/// Sink that records every request it receives, for tests and demos.
#[derive(Debug, Default)]
pub struct RecordingMarkReadSink {
    requests: Mutex<Vec<MarkReadRequest>>,
}

impl RecordingMarkReadSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<MarkReadRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MarkReadSink for RecordingMarkReadSink {
    fn mark_read(&self, request: MarkReadRequest) {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_matches_identity() {
        let claim = FocusClaim::new(ColumnId::new("unread"), ItemId::new("item-1"));
        assert!(claim.matches(&ColumnId::new("unread"), &ItemId::new("item-1")));
        assert!(!claim.matches(&ColumnId::new("saved"), &ItemId::new("item-1")));
        assert!(!claim.matches(&ColumnId::new("unread"), &ItemId::new("item-2")));
    }

    #[test]
    fn local_read_request_shape() {
        let request = MarkReadRequest::local_read(ItemId::new("item-9"));
        assert_eq!(request.item_ids, vec![ItemId::new("item-9")]);
        assert!(!request.unread);
        assert!(request.local_only);
    }

    #[test]
    fn recording_sink_captures_requests() {
        let sink = RecordingMarkReadSink::new();
        sink.mark_read(MarkReadRequest::local_read(ItemId::new("a")));
        sink.mark_read(MarkReadRequest::local_read(ItemId::new("b")));
        let seen = sink.requests();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].item_ids[0].as_str(), "a");
    }
}
