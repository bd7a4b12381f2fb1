//! Theming collaborator: background key resolution plus the key-to-color
//! lookup table.
//!
//! `resolve_background_key` is the pure decision function; [`Palette`] maps
//! the resulting key to a concrete ANSI sequence. Callers that embed the
//! engine in another surface can supply their own palette table.

/// Tone half of a background key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Dark,
    Light,
}

/// Shade half of a background key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shade {
    Base,
    Muted,
    Hover,
    MutedHover,
}

/// Symbolic background color key, resolved before any palette lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackgroundKey {
    pub tone: Tone,
    pub shade: Shade,
}

/// Inputs to background resolution. `is_muted` is true for read items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundInputs {
    pub is_dark: bool,
    pub is_muted: bool,
    pub is_hovered: bool,
}

/// Pure mapping from state flags to a background key.
pub fn resolve_background_key(inputs: BackgroundInputs) -> BackgroundKey {
    let tone = if inputs.is_dark {
        Tone::Dark
    } else {
        Tone::Light
    };
    let shade = match (inputs.is_muted, inputs.is_hovered) {
        (false, false) => Shade::Base,
        (true, false) => Shade::Muted,
        (false, true) => Shade::Hover,
        (true, true) => Shade::MutedHover,
    };
    BackgroundKey { tone, shade }
}

/// Key-to-color lookup table. Colors are 256-color ANSI background
/// sequences; the accent is used for the focus ring marker.
#[derive(Debug, Clone)]
pub struct Palette {
    pub dark_base: &'static str,
    pub dark_muted: &'static str,
    pub dark_hover: &'static str,
    pub dark_muted_hover: &'static str,
    pub light_base: &'static str,
    pub light_muted: &'static str,
    pub light_hover: &'static str,
    pub light_muted_hover: &'static str,
    pub accent: &'static str,
}

pub const RESET: &str = "\x1b[0m";

impl Default for Palette {
    fn default() -> Self {
        Self {
            dark_base: "\x1b[48;5;235m",
            dark_muted: "\x1b[48;5;233m",
            dark_hover: "\x1b[48;5;238m",
            dark_muted_hover: "\x1b[48;5;236m",
            light_base: "\x1b[48;5;255m",
            light_muted: "\x1b[48;5;252m",
            light_hover: "\x1b[48;5;253m",
            light_muted_hover: "\x1b[48;5;250m",
            accent: "\x1b[38;5;75m",
        }
    }
}

impl Palette {
    /// Look up the concrete color sequence for a background key.
    pub fn background(&self, key: BackgroundKey) -> &'static str {
        match (key.tone, key.shade) {
            (Tone::Dark, Shade::Base) => self.dark_base,
            (Tone::Dark, Shade::Muted) => self.dark_muted,
            (Tone::Dark, Shade::Hover) => self.dark_hover,
            (Tone::Dark, Shade::MutedHover) => self.dark_muted_hover,
            (Tone::Light, Shade::Base) => self.light_base,
            (Tone::Light, Shade::Muted) => self.light_muted,
            (Tone::Light, Shade::Hover) => self.light_hover,
            (Tone::Light, Shade::MutedHover) => self.light_muted_hover,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_covers_every_flag_combination() {
        let hovered_muted = resolve_background_key(BackgroundInputs {
            is_dark: true,
            is_muted: true,
            is_hovered: true,
        });
        assert_eq!(hovered_muted.tone, Tone::Dark);
        assert_eq!(hovered_muted.shade, Shade::MutedHover);

        let light_base = resolve_background_key(BackgroundInputs {
            is_dark: false,
            is_muted: false,
            is_hovered: false,
        });
        assert_eq!(light_base.tone, Tone::Light);
        assert_eq!(light_base.shade, Shade::Base);
    }

    #[test]
    fn resolution_is_deterministic() {
        let inputs = BackgroundInputs {
            is_dark: true,
            is_muted: false,
            is_hovered: true,
        };
        assert_eq!(
            resolve_background_key(inputs),
            resolve_background_key(inputs)
        );
    }

    #[test]
    fn palette_lookup_distinguishes_shades() {
        let palette = Palette::default();
        let base = palette.background(BackgroundKey {
            tone: Tone::Dark,
            shade: Shade::Base,
        });
        let hover = palette.background(BackgroundKey {
            tone: Tone::Dark,
            shade: Shade::Hover,
        });
        assert_ne!(base, hover);
    }
}
