//! Pointer hover detection, polymorphic over pointer-capable and
//! touch-only surfaces.
//!
//! The adapter tracks which card identity the pointer currently sits on
//! and turns raw position reports into enter/leave transitions. On a
//! touch-only surface it never fires.

use crate::model::{ColumnId, ItemId};
use crate::platform::PointerCapability;

/// A hover edge for one card identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverTransition {
    pub column_id: ColumnId,
    pub item_id: ItemId,
    pub entered: bool,
}

/// Tracks the hovered card and emits transitions on change. The variant is
/// chosen once at startup from the platform capability.
#[derive(Debug)]
pub enum HoverInputAdapter {
    PointerCapable {
        current: Option<(ColumnId, ItemId)>,
    },
    TouchOnly,
}

impl HoverInputAdapter {
    pub fn new(capability: PointerCapability) -> Self {
        match capability {
            PointerCapability::PointerCapable => Self::PointerCapable { current: None },
            PointerCapability::TouchOnly => Self::TouchOnly,
        }
    }

    /// Report the identity currently under the pointer (`None` for empty
    /// space). Returns leave/enter transitions in that order.
    pub fn pointer_at(&mut self, hit: Option<(ColumnId, ItemId)>) -> Vec<HoverTransition> {
        let current = match self {
            Self::TouchOnly => return Vec::new(),
            Self::PointerCapable { current } => current,
        };

        if *current == hit {
            return Vec::new();
        }

        let mut transitions = Vec::new();
        if let Some((column_id, item_id)) = current.take() {
            transitions.push(HoverTransition {
                column_id,
                item_id,
                entered: false,
            });
        }
        if let Some((column_id, item_id)) = hit {
            transitions.push(HoverTransition {
                column_id: column_id.clone(),
                item_id: item_id.clone(),
                entered: true,
            });
            *current = Some((column_id, item_id));
        }
        transitions
    }

    /// Pointer left the surface entirely.
    pub fn pointer_gone(&mut self) -> Vec<HoverTransition> {
        self.pointer_at(None)
    }

    pub fn hovered(&self) -> Option<&(ColumnId, ItemId)> {
        match self {
            Self::PointerCapable { current } => current.as_ref(),
            Self::TouchOnly => None,
        }
    }
}
