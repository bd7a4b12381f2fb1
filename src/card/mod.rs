//! Card visual-state controllers and paint reconciliation.
//!
//! A controller owns three signals per card: focus, hover, and read state.
//! Reconciliation is a pure function; application is an imperative surface
//! mutation so hover feedback never waits on a content re-render.

mod core;
mod paint;

pub use core::{CardContext, CardController, DEFAULT_READ_MARK_DELAY};
pub use paint::{CardPaint, CardVisualState, PaintCaps, compute_paint};
