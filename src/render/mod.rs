//! Render surfaces and the ANSI renderer that flushes them.

mod core;

pub use core::{AnsiRenderer, CardSurface, RendererSettings};
