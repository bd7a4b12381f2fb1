use crate::theme::{BackgroundInputs, BackgroundKey, resolve_background_key};

/// Snapshot of the three signals a card reconciles into one visual outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardVisualState {
    pub is_focused: bool,
    pub is_hovered: bool,
    pub is_read: bool,
}

/// Capabilities that parameterize paint reconciliation. Fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintCaps {
    pub supports_pointer_hover: bool,
    pub is_dark: bool,
}

/// The reconciled visual outcome: which background to use and how visible
/// the focus ring is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPaint {
    pub background: BackgroundKey,
    pub focus_ring_opacity: f32,
}

/// Pure reconciliation of `(focused, hovered, read)` into a paint.
///
/// On touch-only surfaces hover can never be true at the input layer, but
/// the paint treats it as permanently false regardless, so a stray flag can
/// not produce a hover style that the platform has no way to clear.
pub fn compute_paint(state: CardVisualState, caps: PaintCaps) -> CardPaint {
    let hovered = state.is_hovered && caps.supports_pointer_hover;
    let background = resolve_background_key(BackgroundInputs {
        is_dark: caps.is_dark,
        is_muted: state.is_read,
        is_hovered: hovered,
    });
    CardPaint {
        background,
        focus_ring_opacity: if state.is_focused { 1.0 } else { 0.0 },
    }
}
