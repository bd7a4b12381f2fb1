//! Feed layout: column rectangles and hit testing. The solver lives in the
//! private `core` module.

mod core;

pub use core::{CARD_HEIGHT, ColumnSpec, FeedLayout};
