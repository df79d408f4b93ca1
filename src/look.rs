//! Look-and-feel: the colors and style flags a waveform is drawn with.
//!
//! A `LookAndFeel` is an immutable value. Changing any part of it means
//! building a new one (the `with_*` helpers do that) and handing it to the
//! renderer as a whole.

/// Linear RGBA color, each channel in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// How the envelope is turned into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum FillStyle {
    /// Solid shape between the top and bottom envelope.
    #[default]
    Filled = 0,
    /// Closed outline tracing the envelope.
    Outline = 1,
}

impl FillStyle {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => FillStyle::Outline,
            _ => FillStyle::Filled,
        }
    }
}

/// Rendering parameters for one waveform view.
#[derive(Debug, Clone, PartialEq)]
pub struct LookAndFeel {
    /// Waveform color.
    pub foreground: Color,
    /// Color of the selected span.
    pub highlight: Color,
    pub fill: FillStyle,
    /// Draw a reflected bottom half (bottom = -top).
    pub mirrored: bool,
    /// Amplitude multiplier applied before clamping to -1.0..=1.0.
    pub gain: f32,
}

impl LookAndFeel {
    pub const DEFAULT_FOREGROUND: Color = Color::rgb(0.0, 0.48, 1.0);
    pub const DEFAULT_HIGHLIGHT: Color = Color::new(1.0, 0.8, 0.0, 0.5);

    pub fn with_foreground(&self, foreground: Color) -> Self {
        Self {
            foreground,
            ..self.clone()
        }
    }

    pub fn with_highlight(&self, highlight: Color) -> Self {
        Self {
            highlight,
            ..self.clone()
        }
    }

    pub fn with_fill(&self, fill: FillStyle) -> Self {
        Self {
            fill,
            ..self.clone()
        }
    }

    pub fn with_mirrored(&self, mirrored: bool) -> Self {
        Self {
            mirrored,
            ..self.clone()
        }
    }

    pub fn with_gain(&self, gain: f32) -> Self {
        Self {
            gain,
            ..self.clone()
        }
    }

    /// Scale and clamp a raw amplitude for display.
    #[inline]
    pub(crate) fn scale(&self, amplitude: f32) -> f32 {
        (amplitude * self.gain).clamp(-1.0, 1.0)
    }
}

impl Default for LookAndFeel {
    fn default() -> Self {
        Self {
            foreground: Self::DEFAULT_FOREGROUND,
            highlight: Self::DEFAULT_HIGHLIGHT,
            fill: FillStyle::Filled,
            mirrored: true,
            gain: 1.0,
        }
    }
}
