use thiserror::Error;

/// Unified result type for the cardrail crate.
pub type Result<T> = std::result::Result<T, CardError>;

/// Errors surfaced by the feed engine.
///
/// Visual-state coordination itself never errors; failures there degrade to
/// "the paint did not update". These variants cover the structural paths:
/// layout, lookup, and terminal I/O.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("feed layout has no columns")]
    EmptyLayout,
    #[error("column `{0}` not found")]
    ColumnNotFound(String),
    #[error("item `{0}` not found in column `{1}`")]
    ItemNotFound(String, String),
    #[error("terminal backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
