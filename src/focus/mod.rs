//! Focus coordination: the broadcast bus, the per-item registry, and the
//! coordinator object that owns both.
//!
//! Exclusivity is cooperative. A card whose focus changes due to local
//! input tells the registry about its own change and publishes a claim on
//! the bus; every other card reacts to the claim by clearing its own flag.
//! No central object holds "the" focused identity.

mod bus;
mod coordinator;
mod registry;

pub use bus::{ClaimHandler, FocusBroadcastBus, SubscriberToken};
pub use coordinator::{FocusCoordinator, SharedCoordinator};
pub use registry::{FocusCallback, ItemFocusRegistry, RegistrationToken};
