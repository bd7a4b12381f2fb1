use std::io::Write;
use std::sync::{Arc, Mutex};

use blake3::Hash;

use crate::card::CardPaint;
use crate::error::Result;
use crate::geometry::Rect;
use crate::theme::{Palette, RESET};
use crate::width::{clip_to_width, display_width};

const FOCUS_RING_GLYPH: &str = "▌";

/// Mutable render target for a single card.
///
/// Controllers mutate surfaces directly instead of going through a render
/// pass, so hover and focus feedback land without re-rendering card
/// content. A blake3 hash of the composed style guards against redundant
/// repaints.
pub struct CardSurface {
    inner: Mutex<SurfaceState>,
}

struct SurfaceState {
    rect: Rect,
    title: String,
    link: String,
    style: Option<FrameStyle>,
    style_hash: Option<Hash>,
    dirty: bool,
    native_focus_requested: bool,
}

#[derive(Clone, Copy)]
struct FrameStyle {
    background: &'static str,
    ring_visible: bool,
    accent: &'static str,
}

impl CardSurface {
    pub fn new(rect: Rect, title: impl Into<String>, link: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(SurfaceState {
                rect,
                title: title.into(),
                link: link.into(),
                style: None,
                style_hash: None,
                dirty: true,
                native_focus_requested: false,
            }),
        })
    }

    /// Apply a reconciled paint. Returns whether the surface actually
    /// changed; a hash-identical paint is skipped entirely.
    pub fn apply_paint(&self, paint: &CardPaint, palette: &Palette) -> bool {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(_) => return false,
        };

        let style = FrameStyle {
            background: palette.background(paint.background),
            ring_visible: paint.focus_ring_opacity > 0.0,
            accent: palette.accent,
        };

        let mut hasher = blake3::Hasher::new();
        hasher.update(style.background.as_bytes());
        hasher.update(&[u8::from(style.ring_visible)]);
        hasher.update(guard.title.as_bytes());
        let hash = hasher.finalize();

        if guard.style_hash == Some(hash) {
            return false;
        }

        guard.style = Some(style);
        guard.style_hash = Some(hash);
        guard.dirty = true;
        true
    }

    /// Move the surface after a relayout. The next frame redraws in place.
    pub fn set_rect(&self, rect: Rect) {
        if let Ok(mut guard) = self.inner.lock() {
            if guard.rect != rect {
                guard.rect = rect;
                guard.dirty = true;
            }
        }
    }

    pub fn rect(&self) -> Rect {
        self.inner
            .lock()
            .map(|guard| guard.rect)
            .unwrap_or(Rect::new(0, 0, 0, 0))
    }

    /// Ask the renderer to park the terminal cursor on this card, the
    /// terminal analog of driving native input focus to an element.
    pub fn request_native_focus(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.native_focus_requested = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.lock().map(|guard| guard.dirty).unwrap_or(false)
    }

    fn take_frame(&self) -> Option<FrameSnapshot> {
        let mut guard = self.inner.lock().ok()?;
        if !guard.dirty {
            return None;
        }
        guard.dirty = false;
        let style = guard.style?;
        Some(FrameSnapshot {
            rect: guard.rect,
            lines: compose_frame(guard.rect, &guard.title, &guard.link, style),
            native_focus: std::mem::take(&mut guard.native_focus_requested),
        })
    }
}

struct FrameSnapshot {
    rect: Rect,
    lines: Vec<String>,
    native_focus: bool,
}

fn compose_frame(rect: Rect, title: &str, link: &str, style: FrameStyle) -> Vec<String> {
    if rect.width == 0 || rect.height == 0 {
        return Vec::new();
    }

    let ring = if style.ring_visible {
        format!("{}{FOCUS_RING_GLYPH}{RESET}{}", style.accent, style.background)
    } else {
        " ".to_string()
    };
    let text_width = rect.width.saturating_sub(2) as usize;

    let mut lines = Vec::with_capacity(rect.height as usize);
    for row in 0..rect.height {
        let body = match row {
            0 => clip_to_width(title, text_width),
            1 => clip_to_width(link, text_width),
            _ => String::new(),
        };
        let mut line = format!("{}{ring} {body}", style.background);
        let mut width = display_width(&line);
        while width < rect.width as usize {
            line.push(' ');
            width += 1;
        }
        line.push_str(RESET);
        lines.push(line);
    }
    lines
}

/// Renderer runtime parameters.
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    pub restore_cursor: Option<(u16, u16)>,
}

/// ANSI escape code renderer writing card frames directly to a terminal
/// handle.
pub struct AnsiRenderer {
    settings: RendererSettings,
}

impl AnsiRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    /// Flush every dirty surface. Returns how many frames were written.
    pub fn render(&mut self, writer: &mut impl Write, surfaces: &[Arc<CardSurface>]) -> Result<usize> {
        let mut drawn = 0;
        for surface in surfaces {
            let Some(frame) = surface.take_frame() else {
                continue;
            };
            for (offset, line) in frame.lines.iter().enumerate() {
                write!(
                    writer,
                    "\x1b[{};{}H{}",
                    frame.rect.y + offset as u16 + 1,
                    frame.rect.x + 1,
                    line
                )?;
            }
            if frame.native_focus {
                self.settings.restore_cursor = Some((frame.rect.y, frame.rect.x));
            }
            drawn += 1;
        }

        if let Some((row, col)) = self.settings.restore_cursor {
            write!(writer, "\x1b[{};{}H", row + 1, col + 1)?;
        }
        writer.flush()?;
        Ok(drawn)
    }
}
