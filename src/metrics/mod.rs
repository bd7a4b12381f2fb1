use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters accumulated while the feed is running.
///
/// Repaint counters distinguish actual surface writes from hash-identical
/// paints that were skipped, since the skip rate is what validates the
/// render-bypassing design.
#[derive(Debug, Default, Clone)]
pub struct FeedMetrics {
    events: u64,
    focus_claims: u64,
    hover_transitions: u64,
    repaints: u64,
    skipped_repaints: u64,
    read_marks: u64,
    duplicate_registrations: u64,
}

impl FeedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_focus_claim(&mut self) {
        self.focus_claims = self.focus_claims.saturating_add(1);
    }

    pub fn record_hover_transition(&mut self) {
        self.hover_transitions = self.hover_transitions.saturating_add(1);
    }

    pub fn record_repaint(&mut self, painted: bool) {
        if painted {
            self.repaints = self.repaints.saturating_add(1);
        } else {
            self.skipped_repaints = self.skipped_repaints.saturating_add(1);
        }
    }

    pub fn record_read_mark(&mut self) {
        self.read_marks = self.read_marks.saturating_add(1);
    }

    pub fn record_duplicate_registration(&mut self) {
        self.duplicate_registrations = self.duplicate_registrations.saturating_add(1);
    }

    pub fn duplicate_registrations(&self) -> u64 {
        self.duplicate_registrations
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            events: self.events,
            focus_claims: self.focus_claims,
            hover_transitions: self.hover_transitions,
            repaints: self.repaints,
            skipped_repaints: self.skipped_repaints,
            read_marks: self.read_marks,
            duplicate_registrations: self.duplicate_registrations,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub events: u64,
    pub focus_claims: u64,
    pub hover_transitions: u64,
    pub repaints: u64,
    pub skipped_repaints: u64,
    pub read_marks: u64,
    pub duplicate_registrations: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        let mut fields = LogFields::new();
        fields.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        fields.insert("events".to_string(), json!(self.events));
        fields.insert("focus_claims".to_string(), json!(self.focus_claims));
        fields.insert(
            "hover_transitions".to_string(),
            json!(self.hover_transitions),
        );
        fields.insert("repaints".to_string(), json!(self.repaints));
        fields.insert("skipped_repaints".to_string(), json!(self.skipped_repaints));
        fields.insert("read_marks".to_string(), json!(self.read_marks));
        fields.insert(
            "duplicate_registrations".to_string(),
            json!(self.duplicate_registrations),
        );
        LogEvent::with_fields(LogLevel::Info, target, "feed_metrics", fields)
    }
}
