use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::FeedMetrics;
use crate::model::FocusClaim;

use super::bus::FocusBroadcastBus;
use super::registry::ItemFocusRegistry;

const LOG_TARGET: &str = "cardrail::focus.coordinator";

/// Explicitly constructed home for the broadcast bus and the item focus
/// registry, passed to every card instead of living in ambient global
/// scope. Owning it ties subscription lifetime to the owning feed's
/// lifetime, so teardown stays deterministic.
pub struct FocusCoordinator {
    bus: FocusBroadcastBus,
    registry: ItemFocusRegistry,
    metrics: Arc<Mutex<FeedMetrics>>,
    logger: Option<Logger>,
}

/// Handle shape cards hold onto.
pub type SharedCoordinator = Arc<FocusCoordinator>;

impl FocusCoordinator {
    pub fn new() -> SharedCoordinator {
        Arc::new(Self {
            bus: FocusBroadcastBus::new(),
            registry: ItemFocusRegistry::new(),
            metrics: Arc::new(Mutex::new(FeedMetrics::new())),
            logger: None,
        })
    }

    pub fn with_logger(logger: Logger) -> SharedCoordinator {
        Arc::new(Self {
            bus: FocusBroadcastBus::new(),
            registry: ItemFocusRegistry::with_logger(logger.clone()),
            metrics: Arc::new(Mutex::new(FeedMetrics::new())),
            logger: Some(logger),
        })
    }

    pub fn bus(&self) -> &FocusBroadcastBus {
        &self.bus
    }

    pub fn registry(&self) -> &ItemFocusRegistry {
        &self.registry
    }

    pub fn metrics_handle(&self) -> Arc<Mutex<FeedMetrics>> {
        Arc::clone(&self.metrics)
    }

    /// Publish a focus claim so every sibling card drops its own focus.
    /// Called by the card whose focus changed due to local input.
    pub fn claim_focus(&self, claim: &FocusClaim) {
        if let Ok(mut guard) = self.metrics.lock() {
            guard.record_focus_claim();
        }
        if let Some(logger) = self.logger.as_ref() {
            let _ = logger.log_event(event_with_fields(
                LogLevel::Debug,
                LOG_TARGET,
                "focus_claimed",
                [
                    json_kv("column", json!(claim.column_id.as_str())),
                    json_kv("item", json!(claim.item_id.as_str())),
                ],
            ));
        }
        self.bus.publish(claim);
    }

    pub(crate) fn record_hover_transition(&self) {
        if let Ok(mut guard) = self.metrics.lock() {
            guard.record_hover_transition();
        }
    }

    pub(crate) fn record_repaint(&self, painted: bool) {
        if let Ok(mut guard) = self.metrics.lock() {
            guard.record_repaint(painted);
        }
    }

    pub(crate) fn record_read_mark(&self) {
        if let Ok(mut guard) = self.metrics.lock() {
            guard.record_read_mark();
        }
    }

    pub(crate) fn sync_duplicate_metric(&self) {
        let duplicates = self.registry.duplicate_count();
        if let Ok(mut guard) = self.metrics.lock() {
            while guard.duplicate_registrations() < duplicates {
                guard.record_duplicate_registration();
            }
        }
    }
}
