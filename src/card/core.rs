use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crate::focus::{RegistrationToken, SharedCoordinator, SubscriberToken};
use crate::model::{ColumnId, FocusClaim, Item, ItemId};
use crate::platform::Platform;
use crate::render::CardSurface;
use crate::theme::Palette;
use crate::timer::{DeferredReadMarker, TimerHandle};

use super::paint::{CardVisualState, PaintCaps, compute_paint};

/// How long after activation the read mark fires. Long enough for the
/// navigation transition to finish before the card dims.
pub const DEFAULT_READ_MARK_DELAY: Duration = Duration::from_millis(500);

/// Shared environment every card in a feed mounts against.
#[derive(Clone)]
pub struct CardContext {
    pub coordinator: SharedCoordinator,
    pub read_marker: DeferredReadMarker,
    pub platform: Platform,
    pub palette: Arc<Palette>,
    pub dark: bool,
    pub read_mark_delay: Duration,
}

impl CardContext {
    pub fn new(
        coordinator: SharedCoordinator,
        read_marker: DeferredReadMarker,
        platform: Platform,
    ) -> Self {
        Self {
            coordinator,
            read_marker,
            platform,
            palette: Arc::new(Palette::default()),
            dark: true,
            read_mark_delay: DEFAULT_READ_MARK_DELAY,
        }
    }

    pub fn with_palette(mut self, palette: Arc<Palette>) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_dark(mut self, dark: bool) -> Self {
        self.dark = dark;
        self
    }

    pub fn with_read_mark_delay(mut self, delay: Duration) -> Self {
        self.read_mark_delay = delay;
        self
    }
}

struct CardShared {
    column_id: ColumnId,
    item_id: ItemId,
    state: Mutex<CardVisualState>,
    surface: Weak<CardSurface>,
    coordinator: SharedCoordinator,
    platform: Platform,
    caps: PaintCaps,
    palette: Arc<Palette>,
}

impl CardShared {
    fn snapshot(&self) -> CardVisualState {
        self.state.lock().map(|guard| *guard).unwrap_or_default()
    }

    fn repaint(&self) {
        let paint = compute_paint(self.snapshot(), self.caps);
        // A dead surface handle means unmount raced a pending callback;
        // skipping the paint is the normal outcome, not an error.
        if let Some(surface) = self.surface.upgrade() {
            let painted = surface.apply_paint(&paint, &self.palette);
            self.coordinator.record_repaint(painted);
        }
    }

    fn set_focused(&self, value: bool, suppress_native_sync: bool) {
        let changed = match self.state.lock() {
            Ok(mut guard) => {
                let changed = guard.is_focused != value;
                guard.is_focused = value;
                changed
            }
            Err(_) => return,
        };

        if value && changed && !suppress_native_sync && self.platform.supports_native_focus_sync() {
            if let Some(surface) = self.surface.upgrade() {
                surface.request_native_focus();
            }
        }
        self.repaint();
    }

    fn drop_focus(&self) {
        let dropped = match self.state.lock() {
            Ok(mut guard) if guard.is_focused => {
                guard.is_focused = false;
                true
            }
            _ => false,
        };
        if dropped {
            self.repaint();
        }
    }

    fn set_read(&self, read: bool) {
        let changed = match self.state.lock() {
            Ok(mut guard) => {
                let changed = guard.is_read != read;
                guard.is_read = read;
                changed
            }
            Err(_) => return,
        };
        if changed {
            self.repaint();
        }
    }
}

/// Per-card owner of the focus/hover/read signals and their reconciliation
/// into the card surface.
///
/// Mounting registers the card with the focus registry and subscribes it to
/// the broadcast bus; dropping the controller tears both down and cancels
/// any pending read mark.
pub struct CardController {
    shared: Arc<CardShared>,
    registration: RegistrationToken,
    bus_token: SubscriberToken,
    read_marker: DeferredReadMarker,
    read_mark_delay: Duration,
    pending_read_mark: Mutex<Option<TimerHandle>>,
}

impl CardController {
    pub fn mount(
        ctx: &CardContext,
        column_id: ColumnId,
        item: &Item,
        surface: &Arc<CardSurface>,
    ) -> Self {
        let shared = Arc::new(CardShared {
            column_id: column_id.clone(),
            item_id: item.id.clone(),
            state: Mutex::new(CardVisualState {
                is_focused: false,
                is_hovered: false,
                is_read: item.read,
            }),
            surface: Arc::downgrade(surface),
            coordinator: Arc::clone(&ctx.coordinator),
            platform: ctx.platform,
            caps: PaintCaps {
                supports_pointer_hover: ctx.platform.supports_pointer_hover(),
                is_dark: ctx.dark,
            },
            palette: Arc::clone(&ctx.palette),
        });

        let registry_target = Arc::downgrade(&shared);
        let registration =
            ctx.coordinator
                .registry()
                .register(column_id.clone(), item.id.clone(), move |focused| {
                    if let Some(shared) = registry_target.upgrade() {
                        shared.set_focused(focused, false);
                    }
                });
        ctx.coordinator.sync_duplicate_metric();

        let bus_target = Arc::downgrade(&shared);
        let own_item = item.id.clone();
        let bus_token = ctx.coordinator.bus().subscribe(move |claim| {
            // Claims for our own identity are the echo of our own
            // publication; reacting would recurse.
            if claim.matches(&column_id, &own_item) {
                return;
            }
            if let Some(shared) = bus_target.upgrade() {
                shared.drop_focus();
            }
        });

        let controller = Self {
            shared,
            registration,
            bus_token,
            read_marker: ctx.read_marker.clone(),
            read_mark_delay: ctx.read_mark_delay,
            pending_read_mark: Mutex::new(None),
        };
        controller.shared.repaint();
        controller
    }

    pub fn column_id(&self) -> &ColumnId {
        &self.shared.column_id
    }

    pub fn item_id(&self) -> &ItemId {
        &self.shared.item_id
    }

    pub fn state(&self) -> CardVisualState {
        self.shared.snapshot()
    }

    pub fn is_focused(&self) -> bool {
        self.state().is_focused
    }

    /// Pointer entered (`true`) or left (`false`) the card region.
    ///
    /// Entry promotes the card to focused when nothing keyboard-side holds
    /// it; exit only clears the hover flag, never focus.
    pub fn on_hover(&self, entered: bool) {
        if !self.shared.platform.supports_pointer_hover() {
            return;
        }

        if entered {
            let already_focused = match self.shared.state.lock() {
                Ok(mut guard) => {
                    if guard.is_hovered {
                        return;
                    }
                    guard.is_hovered = true;
                    guard.is_focused
                }
                Err(_) => return,
            };
            self.shared.coordinator.record_hover_transition();

            if !already_focused {
                // Becoming focused goes through the registry so the card's
                // own callback performs the state change and native sync,
                // then the claim defocuses every sibling.
                self.shared.coordinator.registry().notify_focus_changed(
                    &self.shared.column_id,
                    &self.shared.item_id,
                    true,
                );
                self.shared.coordinator.claim_focus(&FocusClaim::new(
                    self.shared.column_id.clone(),
                    self.shared.item_id.clone(),
                ));
            }
            self.shared.repaint();
        } else {
            let cleared = match self.shared.state.lock() {
                Ok(mut guard) if guard.is_hovered => {
                    guard.is_hovered = false;
                    true
                }
                _ => return,
            };
            if cleared {
                self.shared.coordinator.record_hover_transition();
                self.shared.repaint();
            }
        }
    }

    /// Focus changed from outside local pointer input: registry callback,
    /// keyboard navigation, or a native focus event. When the change
    /// already originated from a native event, pass
    /// `suppress_native_sync = true` to avoid a feedback loop.
    pub fn on_external_focus_change(&self, value: bool, suppress_native_sync: bool) {
        self.shared.set_focused(value, suppress_native_sync);
    }

    /// Press or click. Hover is meaningless once navigation is imminent, so
    /// it clears immediately; the read mark is deferred so the card does
    /// not dim before the destination opens.
    pub fn on_activate(&self) {
        if let Ok(mut guard) = self.shared.state.lock() {
            guard.is_hovered = false;
        }
        self.shared.repaint();

        let followup_target = Arc::downgrade(&self.shared);
        let handle = self.read_marker.schedule_with_followup(
            self.shared.item_id.clone(),
            self.read_mark_delay,
            move || {
                if let Some(shared) = followup_target.upgrade() {
                    shared.coordinator.record_read_mark();
                    shared.set_read(true);
                }
            },
        );

        if let Ok(mut guard) = self.pending_read_mark.lock() {
            if let Some(previous) = guard.replace(handle) {
                self.read_marker.cancel(previous);
            }
        }
    }

    /// Structural read-state update routed through this controller
    /// instance. The flag is a cached mirror; another actor changing the
    /// store does not reach it.
    pub fn set_read(&self, read: bool) {
        self.shared.set_read(read);
    }
}

impl Drop for CardController {
    fn drop(&mut self) {
        self.shared
            .coordinator
            .registry()
            .unregister(&self.registration);
        self.shared.coordinator.bus().unsubscribe(self.bus_token);
        if let Ok(mut guard) = self.pending_read_mark.lock() {
            if let Some(handle) = guard.take() {
                self.read_marker.cancel(handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::focus::FocusCoordinator;
    use crate::geometry::Rect;
    use crate::model::{MarkReadRequest, MarkReadSink, RecordingMarkReadSink};
    use crate::timer::TimerQueue;
    use std::time::Instant;

    struct Fixture {
        ctx: CardContext,
        sink: Arc<RecordingMarkReadSink>,
        timers: Arc<TimerQueue>,
    }

    fn fixture(platform: Platform) -> Fixture {
        let timers = Arc::new(TimerQueue::new());
        let sink = Arc::new(RecordingMarkReadSink::new());
        let read_marker = DeferredReadMarker::new(
            Arc::clone(&timers),
            Arc::clone(&sink) as Arc<dyn MarkReadSink>,
        );
        Fixture {
            ctx: CardContext::new(FocusCoordinator::new(), read_marker, platform),
            sink,
            timers,
        }
    }

    fn mount(fx: &Fixture, column: &str, item_id: &str) -> (CardController, Arc<CardSurface>) {
        let item = Item::new(item_id, format!("title {item_id}"), "https://example.com");
        let surface = CardSurface::new(Rect::new(0, 0, 30, 3), &item.title, &item.link);
        let controller = CardController::mount(&fx.ctx, ColumnId::new(column), &item, &surface);
        (controller, surface)
    }

    #[test]
    fn hover_promotes_unfocused_card_and_broadcasts() {
        let fx = fixture(Platform::pointer_capable());
        let claims = Arc::new(Mutex::new(Vec::new()));
        let observer = Arc::clone(&claims);
        fx.ctx.coordinator.bus().subscribe(move |claim| {
            observer.lock().unwrap().push(claim.clone());
        });

        let (card, _surface) = mount(&fx, "unread", "X");
        card.on_hover(true);

        let state = card.state();
        assert!(state.is_focused);
        assert!(state.is_hovered);

        let claims = claims.lock().unwrap();
        assert_eq!(claims.len(), 1);
        assert!(claims[0].matches(&ColumnId::new("unread"), &ItemId::new("X")));
    }

    #[test]
    fn at_most_one_card_focused_across_columns() {
        let fx = fixture(Platform::pointer_capable());
        let cards: Vec<_> = [("left", "a"), ("left", "b"), ("right", "c"), ("right", "d")]
            .iter()
            .map(|(column, item)| mount(&fx, column, item))
            .collect();

        // Arbitrary interleaving of hover and keyboard focus events.
        cards[0].0.on_hover(true);
        cards[2].0.on_hover(true);
        cards[2].0.on_hover(false);
        cards[1].0.on_external_focus_change(true, false);
        fx.ctx.coordinator.claim_focus(&FocusClaim::new(
            cards[1].0.column_id().clone(),
            cards[1].0.item_id().clone(),
        ));
        cards[3].0.on_hover(true);

        let focused: Vec<_> = cards
            .iter()
            .filter(|(card, _)| card.is_focused())
            .map(|(card, _)| card.item_id().as_str().to_string())
            .collect();
        assert_eq!(focused, vec!["d".to_string()]);
    }

    #[test]
    fn hover_steals_focus_from_keyboard_focused_card() {
        let fx = fixture(Platform::pointer_capable());
        let (card_a, _sa) = mount(&fx, "left", "a");
        let (card_b, _sb) = mount(&fx, "right", "b");

        card_a.on_external_focus_change(true, false);
        assert!(card_a.is_focused());

        card_b.on_hover(true);
        assert!(card_b.is_focused());
        assert!(!card_a.is_focused());
    }

    #[test]
    fn hover_out_never_clears_focus() {
        let fx = fixture(Platform::pointer_capable());
        let (card, _surface) = mount(&fx, "col", "a");

        card.on_hover(true);
        card.on_hover(false);
        let state = card.state();
        assert!(state.is_focused);
        assert!(!state.is_hovered);

        // Hover-in promoted the second card; hover-out must not undo it.
        let (other, _other_surface) = mount(&fx, "col", "b");
        other.on_hover(true);
        other.on_hover(false);
        assert!(other.is_focused());
    }

    #[test]
    fn repeated_hover_in_publishes_once() {
        let fx = fixture(Platform::pointer_capable());
        let count = Arc::new(Mutex::new(0u32));
        let observer = Arc::clone(&count);
        fx.ctx
            .coordinator
            .bus()
            .subscribe(move |_| *observer.lock().unwrap() += 1);

        let (card, _surface) = mount(&fx, "col", "a");
        card.on_hover(true);
        card.on_hover(true);
        card.on_hover(true);
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn touch_only_platform_ignores_hover() {
        let fx = fixture(Platform::touch_only());
        let (card, _surface) = mount(&fx, "col", "a");
        card.on_hover(true);
        let state = card.state();
        assert!(!state.is_hovered);
        assert!(!state.is_focused);
    }

    #[test]
    fn activation_clears_hover_and_defers_read_mark() {
        let fx = fixture(Platform::pointer_capable());
        let (card, _surface) = mount(&fx, "col", "a");

        card.on_hover(true);
        card.on_activate();
        let state = card.state();
        assert!(!state.is_hovered);
        assert!(!state.is_read);
        assert!(fx.sink.is_empty());

        fx.timers.fire_due(Instant::now() + DEFAULT_READ_MARK_DELAY);
        assert_eq!(
            fx.sink.requests(),
            vec![MarkReadRequest::local_read(ItemId::new("a"))]
        );
        assert!(card.state().is_read);
    }

    #[test]
    fn unmount_before_delay_cancels_read_mark() {
        let fx = fixture(Platform::pointer_capable());
        let (card, surface) = mount(&fx, "col", "a");
        card.on_activate();
        drop(card);
        drop(surface);

        fx.timers.fire_due(Instant::now() + Duration::from_secs(5));
        assert!(fx.sink.is_empty());
    }

    #[test]
    fn unmount_tears_down_registrations() {
        let fx = fixture(Platform::pointer_capable());
        let (card_a, _sa) = mount(&fx, "col", "a");
        let (card_b, _sb) = mount(&fx, "col", "b");
        assert_eq!(fx.ctx.coordinator.registry().len(), 2);
        assert_eq!(fx.ctx.coordinator.bus().subscriber_count(), 2);

        drop(card_a);
        assert_eq!(fx.ctx.coordinator.registry().len(), 1);
        assert_eq!(fx.ctx.coordinator.bus().subscriber_count(), 1);

        // Notifications for the departed identity are silently dropped.
        fx.ctx.coordinator.registry().notify_focus_changed(
            &ColumnId::new("col"),
            &ItemId::new("a"),
            true,
        );
        assert!(!card_b.is_focused());
    }

    #[test]
    fn repaint_after_surface_teardown_is_skipped() {
        let fx = fixture(Platform::pointer_capable());
        let (card, surface) = mount(&fx, "col", "a");
        drop(surface);
        // Surface handle is dead; this must neither panic nor error.
        card.on_hover(true);
        assert!(card.is_focused());
    }

    #[test]
    fn read_flag_mirrors_item_at_mount() {
        let fx = fixture(Platform::pointer_capable());
        let item = Item::new("a", "title", "link").read(true);
        let surface = CardSurface::new(Rect::new(0, 0, 10, 2), "title", "link");
        let card = CardController::mount(&fx.ctx, ColumnId::new("col"), &item, &surface);
        assert!(card.state().is_read);

        card.set_read(false);
        assert!(!card.state().is_read);
    }
}
