//! Error module orchestrator; the concrete types live in the private
//! `types` module.

mod types;

pub use types::{CardError, Result};
