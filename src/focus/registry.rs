use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::model::{ColumnId, ItemId};

const LOG_TARGET: &str = "cardrail::focus.registry";

/// Callback invoked when the registered identity's focus state changes.
/// The boolean is the new `is_focused` value.
pub type FocusCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Token proving a registration. Generation-checked so a stale token kept
/// past an overwrite can never remove the newer registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationToken {
    column_id: ColumnId,
    item_id: ItemId,
    generation: u64,
}

struct RegistryEntry {
    generation: u64,
    callback: FocusCallback,
}

/// Per-item subscription registry mapping `(column, item)` to a
/// change-notification callback.
///
/// Registering the same identity twice silently replaces the earlier entry
/// (last writer wins), but the occurrence is logged and counted so hosts
/// can find out whether it ever happens in practice.
pub struct ItemFocusRegistry {
    entries: Mutex<HashMap<(ColumnId, ItemId), RegistryEntry>>,
    next_generation: AtomicU64,
    duplicates: AtomicU64,
    logger: Option<Logger>,
}

impl ItemFocusRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            logger: None,
        }
    }

    pub fn with_logger(logger: Logger) -> Self {
        Self {
            logger: Some(logger),
            ..Self::new()
        }
    }

    pub fn register<F>(&self, column_id: ColumnId, item_id: ItemId, callback: F) -> RegistrationToken
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let replaced = match self.entries.lock() {
            Ok(mut guard) => guard
                .insert(
                    (column_id.clone(), item_id.clone()),
                    RegistryEntry {
                        generation,
                        callback: Arc::new(callback),
                    },
                )
                .is_some(),
            Err(_) => false,
        };

        if replaced {
            self.duplicates.fetch_add(1, Ordering::Relaxed);
            if let Some(logger) = self.logger.as_ref() {
                let _ = logger.log_event(event_with_fields(
                    LogLevel::Warn,
                    LOG_TARGET,
                    "duplicate_registration",
                    [
                        json_kv("column", json!(column_id.as_str())),
                        json_kv("item", json!(item_id.as_str())),
                    ],
                ));
            }
        }

        RegistrationToken {
            column_id,
            item_id,
            generation,
        }
    }

    /// Remove a registration. A second call with the same token, or a token
    /// whose registration was already overwritten, has no effect.
    pub fn unregister(&self, token: &RegistrationToken) {
        if let Ok(mut guard) = self.entries.lock() {
            let key = (token.column_id.clone(), token.item_id.clone());
            if guard
                .get(&key)
                .map(|entry| entry.generation == token.generation)
                .unwrap_or(false)
            {
                guard.remove(&key);
            }
        }
    }

    /// Invoke the callback registered for `(column, item)` with the new
    /// focus value. Only the matching identity is notified; fan-out to
    /// sibling cards goes through the broadcast bus instead.
    pub fn notify_focus_changed(&self, column_id: &ColumnId, item_id: &ItemId, is_focused: bool) {
        let callback = match self.entries.lock() {
            Ok(guard) => guard
                .get(&(column_id.clone(), item_id.clone()))
                .map(|entry| Arc::clone(&entry.callback)),
            Err(_) => None,
        };
        // Invoked outside the lock so the callback may re-enter the registry.
        if let Some(callback) = callback {
            callback(is_focused);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times an identity was registered over an existing entry.
    pub fn duplicate_count(&self) -> u64 {
        self.duplicates.load(Ordering::Relaxed)
    }
}

impl Default for ItemFocusRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use std::sync::Mutex as StdMutex;

    fn identity(item: &str) -> (ColumnId, ItemId) {
        (ColumnId::new("col"), ItemId::new(item))
    }

    #[test]
    fn notify_reaches_registered_callback() {
        let registry = ItemFocusRegistry::new();
        let (column, item) = identity("a");
        let observed = Arc::new(StdMutex::new(Vec::new()));

        let sink = Arc::clone(&observed);
        registry.register(column.clone(), item.clone(), move |focused| {
            sink.lock().unwrap().push(focused);
        });

        registry.notify_focus_changed(&column, &item, true);
        registry.notify_focus_changed(&column, &item, false);
        assert_eq!(*observed.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn notify_for_unknown_identity_is_silent() {
        let registry = ItemFocusRegistry::new();
        let (column, item) = identity("missing");
        registry.notify_focus_changed(&column, &item, true);
    }

    #[test]
    fn duplicate_registration_replaces_and_logs() {
        let sink = MemorySink::new();
        let registry = ItemFocusRegistry::with_logger(Logger::new(sink.clone()));
        let (column, item) = identity("a");
        let observed = Arc::new(StdMutex::new(Vec::new()));

        let first = Arc::clone(&observed);
        registry.register(column.clone(), item.clone(), move |_| {
            first.lock().unwrap().push("first");
        });
        let second = Arc::clone(&observed);
        registry.register(column.clone(), item.clone(), move |_| {
            second.lock().unwrap().push("second");
        });

        registry.notify_focus_changed(&column, &item, true);
        // Last writer wins; the earlier callback is gone.
        assert_eq!(*observed.lock().unwrap(), vec!["second"]);
        assert_eq!(registry.duplicate_count(), 1);
        assert_eq!(
            sink.messages_for(LOG_TARGET),
            vec!["duplicate_registration"]
        );
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = ItemFocusRegistry::new();
        let (column, item) = identity("a");
        let token = registry.register(column, item, |_| {});

        registry.unregister(&token);
        assert!(registry.is_empty());
        registry.unregister(&token);
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_token_cannot_remove_newer_registration() {
        let registry = ItemFocusRegistry::new();
        let (column, item) = identity("a");
        let stale = registry.register(column.clone(), item.clone(), |_| {});
        let _current = registry.register(column, item, |_| {});

        registry.unregister(&stale);
        assert_eq!(registry.len(), 1);
    }
}
