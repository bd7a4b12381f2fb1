//! Terminal feed-card engine: columns of story cards with cooperative
//! focus, hover-driven promotion, and deferred read marking.
//!
//! Focus is exclusive by construction but enforced cooperatively: a card
//! that gains focus publishes a claim on the broadcast bus, and every
//! other mounted card drops its own focus in response. Visual state
//! changes write straight to the card's surface; the renderer only
//! repaints surfaces whose composed style actually changed.

pub mod card;
pub mod error;
pub mod focus;
pub mod geometry;
pub mod input;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod theme;
pub mod timer;
pub mod width;

pub use card::{
    CardContext, CardController, CardPaint, CardVisualState, DEFAULT_READ_MARK_DELAY, PaintCaps,
    compute_paint,
};
pub use error::{CardError, Result};
pub use focus::{
    ClaimHandler, FocusBroadcastBus, FocusCoordinator, ItemFocusRegistry, RegistrationToken,
    SharedCoordinator, SubscriberToken,
};
pub use geometry::{Rect, Size};
pub use input::{HoverInputAdapter, HoverTransition};
pub use layout::{CARD_HEIGHT, ColumnSpec, FeedLayout};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{FeedMetrics, MetricSnapshot};
pub use model::{
    ColumnId, FocusClaim, Item, ItemId, MarkReadRequest, MarkReadSink, NullMarkReadSink,
    RecordingMarkReadSink,
};
pub use platform::{OperatingSystem, Platform, PointerCapability};
pub use render::{AnsiRenderer, CardSurface, RendererSettings};
pub use runtime::{FeedRuntime, RuntimeConfig, RuntimeEvent};
pub use theme::{BackgroundInputs, BackgroundKey, Palette, Shade, Tone, resolve_background_key};
pub use timer::{DeferredReadMarker, TimerHandle, TimerQueue};
pub use width::display_width;
