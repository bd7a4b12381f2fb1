//! The feed runtime: crossterm event mapping, tick-driven timers, and the
//! render loop that flushes dirty card surfaces.
//!
//! All handlers run to completion on one logical thread. The only
//! suspended operation is the deferred read mark, which the tick loop
//! drives through the timer queue.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use serde_json::json;

use crate::card::{CardContext, CardController, DEFAULT_READ_MARK_DELAY};
use crate::error::Result;
use crate::focus::{FocusCoordinator, SharedCoordinator};
use crate::geometry::{Rect, Size};
use crate::input::HoverInputAdapter;
use crate::layout::{ColumnSpec, FeedLayout};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::FeedMetrics;
use crate::model::{ColumnId, Item, ItemId, MarkReadSink};
use crate::platform::Platform;
use crate::render::{AnsiRenderer, CardSurface};
use crate::theme::Palette;
use crate::timer::{DeferredReadMarker, TimerQueue};

const LOG_TARGET: &str = "cardrail::runtime";

/// Configuration knobs for the runtime loop.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Interval between synthetic tick events.
    pub tick_interval: Duration,
    /// Optional structured logger used by the runtime.
    pub logger: Option<Logger>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
    /// Delay between card activation and the read mark firing.
    pub read_mark_delay: Duration,
    /// Whether the dark palette tone is active.
    pub dark: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(200),
            logger: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "cardrail::runtime.metrics".to_string(),
            read_mark_delay: DEFAULT_READ_MARK_DELAY,
            dark: true,
        }
    }
}

/// High-level events the runtime reacts to.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Tick { elapsed: Duration },
    Key(KeyEvent),
    Mouse(MouseEvent),
    FocusGained,
    FocusLost,
    Resize(Size),
}

struct MountedCard {
    column_id: ColumnId,
    item_id: ItemId,
    controller: CardController,
    surface: Arc<CardSurface>,
}

/// Owns the columns, the mounted cards, and the shared focus machinery.
pub struct FeedRuntime {
    layout: FeedLayout,
    rects: HashMap<(ColumnId, ItemId), Rect>,
    cards: Vec<MountedCard>,
    coordinator: SharedCoordinator,
    timers: Arc<TimerQueue>,
    hover: HoverInputAdapter,
    platform: Platform,
    renderer: AnsiRenderer,
    config: RuntimeConfig,
    should_exit: bool,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl FeedRuntime {
    pub fn new(
        columns: Vec<(ColumnId, Vec<Item>)>,
        renderer: AnsiRenderer,
        initial_size: Size,
        platform: Platform,
        sink: Arc<dyn MarkReadSink>,
        config: RuntimeConfig,
    ) -> Result<Self> {
        let layout = FeedLayout::new(
            columns
                .iter()
                .map(|(id, items)| {
                    ColumnSpec::new(id.clone(), items.iter().map(|item| item.id.clone()).collect())
                })
                .collect(),
        )?;

        let coordinator = match config.logger.as_ref() {
            Some(logger) => FocusCoordinator::with_logger(logger.clone()),
            None => FocusCoordinator::new(),
        };
        let timers = Arc::new(TimerQueue::new());
        let read_marker = DeferredReadMarker::new(Arc::clone(&timers), sink);
        let ctx = CardContext::new(Arc::clone(&coordinator), read_marker, platform)
            .with_dark(config.dark)
            .with_palette(Arc::new(Palette::default()))
            .with_read_mark_delay(config.read_mark_delay);

        let rects = layout.solve(initial_size);
        let mut cards = Vec::new();
        for (column_id, items) in &columns {
            for item in items {
                let rect = rects
                    .get(&(column_id.clone(), item.id.clone()))
                    .copied()
                    .unwrap_or(Rect::new(0, 0, 0, 0));
                let surface = CardSurface::new(rect, &item.title, &item.link);
                let controller = CardController::mount(&ctx, column_id.clone(), item, &surface);
                cards.push(MountedCard {
                    column_id: column_id.clone(),
                    item_id: item.id.clone(),
                    controller,
                    surface,
                });
            }
        }

        Ok(Self {
            layout,
            rects,
            cards,
            hover: HoverInputAdapter::new(platform.pointer),
            coordinator,
            timers,
            platform,
            renderer,
            config,
            should_exit: false,
            start_instant: None,
            last_metrics_emit: None,
        })
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn coordinator(&self) -> &SharedCoordinator {
        &self.coordinator
    }

    pub fn metrics_handle(&self) -> Arc<Mutex<FeedMetrics>> {
        self.coordinator.metrics_handle()
    }

    /// Identity of the card currently holding item focus, if any.
    pub fn focused_identity(&self) -> Option<(ColumnId, ItemId)> {
        self.cards
            .iter()
            .find(|card| card.controller.is_focused())
            .map(|card| (card.column_id.clone(), card.item_id.clone()))
    }

    pub fn card_state(&self, column_id: &ColumnId, item_id: &ItemId) -> Option<crate::card::CardVisualState> {
        self.card(column_id, item_id)
            .map(|card| card.controller.state())
    }

    /// Drive the runtime against live terminal input until exit.
    pub fn run(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.bootstrap(stdout)?;
        let mut last_tick = Instant::now();

        while !self.should_exit {
            let now = Instant::now();
            let tick_remaining = self
                .config
                .tick_interval
                .checked_sub(last_tick.elapsed())
                .unwrap_or(Duration::ZERO);
            let timeout = match self.timers.next_deadline() {
                Some(deadline) => tick_remaining.min(deadline.saturating_duration_since(now)),
                None => tick_remaining,
            };

            if event::poll(timeout)? {
                if let Some(runtime_event) = self.map_event(event::read()?) {
                    self.dispatch_event(runtime_event);
                    self.render_if_needed(stdout)?;
                }
                if self.should_exit {
                    break;
                }
            }

            if last_tick.elapsed() >= self.config.tick_interval {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick);
                last_tick = now;
                self.dispatch_event(RuntimeEvent::Tick { elapsed });
                self.render_if_needed(stdout)?;
            } else if self
                .timers
                .next_deadline()
                .map(|deadline| deadline <= Instant::now())
                .unwrap_or(false)
            {
                self.timers.fire_due(Instant::now());
                self.render_if_needed(stdout)?;
            }

            self.maybe_emit_metrics();
        }

        self.finalize();
        Ok(())
    }

    /// Replay a fixed event sequence. Used by tests and benches.
    pub fn run_scripted<I>(&mut self, stdout: &mut impl Write, events: I) -> Result<()>
    where
        I: IntoIterator<Item = RuntimeEvent>,
    {
        self.bootstrap(stdout)?;
        for runtime_event in events {
            self.dispatch_event(runtime_event);
            self.render_if_needed(stdout)?;
            if self.should_exit {
                break;
            }
        }
        self.finalize();
        Ok(())
    }

    fn bootstrap(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.should_exit = false;
        let now = Instant::now();
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
        self.log_event(
            LogLevel::Info,
            "runtime_started",
            [
                json_kv("cards", json!(self.cards.len())),
                json_kv("columns", json!(self.layout.columns().len())),
                json_kv(
                    "pointer_hover",
                    json!(self.platform.supports_pointer_hover()),
                ),
            ],
        );
        self.render_if_needed(stdout)
    }

    fn finalize(&mut self) {
        let uptime_ms = self
            .start_instant
            .map(|start| start.elapsed().as_millis())
            .unwrap_or(0);
        self.log_event(
            LogLevel::Info,
            "runtime_stopped",
            [json_kv("uptime_ms", json!(uptime_ms))],
        );
    }

    fn map_event(&self, crossterm_event: CrosstermEvent) -> Option<RuntimeEvent> {
        match crossterm_event {
            CrosstermEvent::Key(key) => Some(RuntimeEvent::Key(key)),
            CrosstermEvent::Mouse(mouse) => Some(RuntimeEvent::Mouse(mouse)),
            CrosstermEvent::FocusGained => Some(RuntimeEvent::FocusGained),
            CrosstermEvent::FocusLost => Some(RuntimeEvent::FocusLost),
            CrosstermEvent::Resize(width, height) => {
                Some(RuntimeEvent::Resize(Size::new(width, height)))
            }
            CrosstermEvent::Paste(_) => None,
        }
    }

    fn dispatch_event(&mut self, runtime_event: RuntimeEvent) {
        if let Ok(mut guard) = self.coordinator.metrics_handle().lock() {
            guard.record_event();
        }

        match &runtime_event {
            RuntimeEvent::Tick { .. } => {
                self.timers.fire_due(Instant::now());
            }
            RuntimeEvent::Key(key) => self.handle_key(*key),
            RuntimeEvent::Mouse(mouse) => self.handle_mouse(*mouse),
            RuntimeEvent::FocusLost => {
                for transition in self.hover.pointer_gone() {
                    if let Some(card) = self.card(&transition.column_id, &transition.item_id) {
                        card.controller.on_hover(transition.entered);
                    }
                }
            }
            RuntimeEvent::FocusGained => {}
            RuntimeEvent::Resize(size) => self.handle_resize(*size),
        }

        self.log_event(
            LogLevel::Debug,
            "event_dispatched",
            [json_kv("event", json!(Self::describe_event(&runtime_event)))],
        );
        self.maybe_emit_metrics();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_exit = true,
            KeyCode::Up => self.move_focus_vertical(-1),
            KeyCode::Down => self.move_focus_vertical(1),
            KeyCode::Left => self.move_focus_horizontal(-1),
            KeyCode::Right | KeyCode::Tab => self.move_focus_horizontal(1),
            KeyCode::Enter => {
                if let Some((column_id, item_id)) = self.focused_identity() {
                    if let Some(card) = self.card(&column_id, &item_id) {
                        card.controller.on_activate();
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                let hit = FeedLayout::hit_test(&self.rects, mouse.column, mouse.row);
                for transition in self.hover.pointer_at(hit) {
                    if let Some(card) = self.card(&transition.column_id, &transition.item_id) {
                        card.controller.on_hover(transition.entered);
                    }
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some((column_id, item_id)) =
                    FeedLayout::hit_test(&self.rects, mouse.column, mouse.row)
                {
                    self.focus_identity(&column_id, &item_id);
                    if let Some(card) = self.card(&column_id, &item_id) {
                        card.controller.on_activate();
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_resize(&mut self, size: Size) {
        self.rects = self.layout.solve(size);
        for card in &self.cards {
            let rect = self
                .rects
                .get(&(card.column_id.clone(), card.item_id.clone()))
                .copied()
                .unwrap_or(Rect::new(0, 0, 0, 0));
            card.surface.set_rect(rect);
        }
        self.log_event(
            LogLevel::Info,
            "resized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
    }

    /// Move item focus by whole cards within the focused column.
    fn move_focus_vertical(&mut self, delta: isize) {
        let Some((column_id, item_id)) = self.focused_identity() else {
            self.focus_first();
            return;
        };
        let Ok(column) = self.layout.column_mut(&column_id) else {
            return;
        };
        let Some(position) = column.items.iter().position(|item| item == &item_id) else {
            return;
        };
        let next = position as isize + delta;
        if next < 0 || next as usize >= column.items.len() {
            return;
        }
        let target = column.items[next as usize].clone();
        self.focus_identity(&column_id, &target);
    }

    /// Move item focus to the neighboring column, keeping the row slot.
    fn move_focus_horizontal(&mut self, delta: isize) {
        let Some((column_id, item_id)) = self.focused_identity() else {
            self.focus_first();
            return;
        };
        let columns = self.layout.columns();
        let Some(column_index) = columns.iter().position(|column| column.id == column_id) else {
            return;
        };
        let next = column_index as isize + delta;
        if next < 0 || next as usize >= columns.len() {
            return;
        }
        let target_column = &columns[next as usize];
        if target_column.items.is_empty() {
            return;
        }
        let slot = columns[column_index]
            .items
            .iter()
            .position(|item| item == &item_id)
            .unwrap_or(0)
            .min(target_column.items.len() - 1);
        let target_column_id = target_column.id.clone();
        let target_item = target_column.items[slot].clone();
        self.focus_identity(&target_column_id, &target_item);
    }

    fn focus_first(&mut self) {
        if let Some((column_id, item_id)) = self.layout.ordered_identities().into_iter().next() {
            self.focus_identity(&column_id, &item_id);
        }
    }

    /// Keyboard/programmatic focus path: notify the target card through
    /// the registry, then claim so every other card drops focus.
    fn focus_identity(&mut self, column_id: &ColumnId, item_id: &ItemId) {
        self.coordinator
            .registry()
            .notify_focus_changed(column_id, item_id, true);
        self.coordinator.claim_focus(&crate::model::FocusClaim::new(
            column_id.clone(),
            item_id.clone(),
        ));
    }

    fn card(&self, column_id: &ColumnId, item_id: &ItemId) -> Option<&MountedCard> {
        self.cards
            .iter()
            .find(|card| &card.column_id == column_id && &card.item_id == item_id)
    }

    fn render_if_needed(&mut self, stdout: &mut impl Write) -> Result<()> {
        if !self.cards.iter().any(|card| card.surface.is_dirty()) {
            return Ok(());
        }
        let surfaces: Vec<Arc<CardSurface>> = self
            .cards
            .iter()
            .map(|card| Arc::clone(&card.surface))
            .collect();
        let drawn = self.renderer.render(stdout, &surfaces)?;
        if drawn > 0 {
            self.log_event(
                LogLevel::Debug,
                "render_completed",
                [json_kv("dirty_cards", json!(drawn))],
            );
        }
        Ok(())
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval == Duration::ZERO {
            return;
        }
        let now = Instant::now();
        match self.last_metrics_emit {
            Some(last) if now.duration_since(last) < self.config.metrics_interval => return,
            _ => self.last_metrics_emit = Some(now),
        }

        let uptime = self
            .start_instant
            .map(|start| now.duration_since(start))
            .unwrap_or_default();
        if let Some(logger) = self.config.logger.as_ref() {
            if let Ok(guard) = self.coordinator.metrics_handle().lock() {
                let snapshot_event = guard.snapshot(uptime).to_log_event(&self.config.metrics_target);
                let _ = logger.log_event(snapshot_event);
            }
        }
    }

    fn log_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let log = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(log);
        }
    }

    fn describe_event(runtime_event: &RuntimeEvent) -> &'static str {
        match runtime_event {
            RuntimeEvent::Tick { .. } => "tick",
            RuntimeEvent::Key(_) => "key",
            RuntimeEvent::Mouse(_) => "mouse",
            RuntimeEvent::FocusGained => "focus_gained",
            RuntimeEvent::FocusLost => "focus_lost",
            RuntimeEvent::Resize(_) => "resize",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MarkReadRequest, RecordingMarkReadSink};
    use crossterm::event::{KeyModifiers, KeyEventState};
    use std::io;

    fn key(code: KeyCode) -> RuntimeEvent {
        RuntimeEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn mouse_moved(column: u16, row: u16) -> RuntimeEvent {
        RuntimeEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Moved,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn mouse_click(column: u16, row: u16) -> RuntimeEvent {
        RuntimeEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn build(sink: Arc<RecordingMarkReadSink>, config: RuntimeConfig) -> FeedRuntime {
        let columns = vec![
            (
                ColumnId::new("unread"),
                vec![
                    Item::new("a", "First story", "https://example.com/a"),
                    Item::new("b", "Second story", "https://example.com/b"),
                ],
            ),
            (
                ColumnId::new("saved"),
                vec![Item::new("c", "Saved story", "https://example.com/c").saved(true)],
            ),
        ];
        FeedRuntime::new(
            columns,
            AnsiRenderer::with_default(),
            Size::new(80, 24),
            Platform::pointer_capable(),
            sink,
            config,
        )
        .unwrap()
    }

    #[test]
    fn hover_script_focuses_hit_card() {
        let sink = Arc::new(RecordingMarkReadSink::new());
        let mut runtime = build(Arc::clone(&sink), RuntimeConfig::default());

        runtime
            .run_scripted(&mut io::sink(), [mouse_moved(5, 1)])
            .unwrap();

        assert_eq!(
            runtime.focused_identity(),
            Some((ColumnId::new("unread"), ItemId::new("a")))
        );
        let state = runtime
            .card_state(&ColumnId::new("unread"), &ItemId::new("a"))
            .unwrap();
        assert!(state.is_hovered);
    }

    #[test]
    fn hover_moving_between_columns_keeps_one_focus() {
        let sink = Arc::new(RecordingMarkReadSink::new());
        let mut runtime = build(Arc::clone(&sink), RuntimeConfig::default());

        runtime
            .run_scripted(&mut io::sink(), [mouse_moved(5, 1), mouse_moved(45, 1)])
            .unwrap();

        assert_eq!(
            runtime.focused_identity(),
            Some((ColumnId::new("saved"), ItemId::new("c")))
        );
        let previous = runtime
            .card_state(&ColumnId::new("unread"), &ItemId::new("a"))
            .unwrap();
        assert!(!previous.is_focused);
        assert!(!previous.is_hovered);
    }

    #[test]
    fn keyboard_navigation_moves_focus() {
        let sink = Arc::new(RecordingMarkReadSink::new());
        let mut runtime = build(Arc::clone(&sink), RuntimeConfig::default());

        runtime
            .run_scripted(
                &mut io::sink(),
                [key(KeyCode::Down), key(KeyCode::Down), key(KeyCode::Right)],
            )
            .unwrap();

        // First Down lands on the first card, second moves to "b", Right
        // clamps to the only card in the saved column.
        assert_eq!(
            runtime.focused_identity(),
            Some((ColumnId::new("saved"), ItemId::new("c")))
        );
    }

    #[test]
    fn click_activates_and_tick_marks_read() {
        let sink = Arc::new(RecordingMarkReadSink::new());
        let config = RuntimeConfig {
            read_mark_delay: Duration::ZERO,
            ..RuntimeConfig::default()
        };
        let mut runtime = build(Arc::clone(&sink), config);

        runtime
            .run_scripted(
                &mut io::sink(),
                [
                    mouse_click(5, 1),
                    RuntimeEvent::Tick {
                        elapsed: Duration::from_millis(200),
                    },
                ],
            )
            .unwrap();

        assert_eq!(
            sink.requests(),
            vec![MarkReadRequest::local_read(ItemId::new("a"))]
        );
        let state = runtime
            .card_state(&ColumnId::new("unread"), &ItemId::new("a"))
            .unwrap();
        assert!(state.is_read);
        assert!(state.is_focused);
    }

    #[test]
    fn quit_key_stops_the_script() {
        let sink = Arc::new(RecordingMarkReadSink::new());
        let mut runtime = build(Arc::clone(&sink), RuntimeConfig::default());

        runtime
            .run_scripted(
                &mut io::sink(),
                [key(KeyCode::Char('q')), key(KeyCode::Down)],
            )
            .unwrap();

        // The Down after quit never ran.
        assert_eq!(runtime.focused_identity(), None);
    }

    #[test]
    fn resize_moves_surfaces() {
        let sink = Arc::new(RecordingMarkReadSink::new());
        let mut runtime = build(Arc::clone(&sink), RuntimeConfig::default());

        runtime
            .run_scripted(
                &mut io::sink(),
                [RuntimeEvent::Resize(Size::new(40, 12)), mouse_moved(25, 1)],
            )
            .unwrap();

        // After halving the width the saved column starts at x = 20.
        assert_eq!(
            runtime.focused_identity(),
            Some((ColumnId::new("saved"), ItemId::new("c")))
        );
    }

    #[test]
    fn scripted_run_emits_lifecycle_logs() {
        let memory = crate::logging::MemorySink::new();
        let config = RuntimeConfig {
            logger: Some(Logger::new(memory.clone())),
            ..RuntimeConfig::default()
        };
        let sink = Arc::new(RecordingMarkReadSink::new());
        let mut runtime = build(sink, config);

        runtime
            .run_scripted(&mut io::sink(), [mouse_moved(5, 1)])
            .unwrap();

        let messages = memory.messages_for(LOG_TARGET);
        assert!(messages.contains(&"runtime_started".to_string()));
        assert!(messages.contains(&"event_dispatched".to_string()));
        assert!(messages.contains(&"runtime_stopped".to_string()));
    }

    #[test]
    fn touch_platform_script_never_hovers() {
        let sink = Arc::new(RecordingMarkReadSink::new());
        let columns = vec![(
            ColumnId::new("unread"),
            vec![Item::new("a", "First story", "https://example.com/a")],
        )];
        let mut runtime = FeedRuntime::new(
            columns,
            AnsiRenderer::with_default(),
            Size::new(80, 24),
            Platform::touch_only(),
            sink,
            RuntimeConfig::default(),
        )
        .unwrap();

        runtime
            .run_scripted(&mut io::sink(), [mouse_moved(5, 1)])
            .unwrap();
        assert_eq!(runtime.focused_identity(), None);
    }
}
