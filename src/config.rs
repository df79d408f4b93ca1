// src/config.rs
//
// View construction settings shared by the platform adapters.

use crate::geometry::Viewport;
use crate::look::LookAndFeel;

/// Initial drawable width in pixels. Zero until the host lays the view out.
pub const DEFAULT_WIDTH: u32 = 0;
/// Initial drawable height in pixels.
pub const DEFAULT_HEIGHT: u32 = 0;
/// Build geometry on a worker thread unless the host opts out.
pub const DEFAULT_THREADED: bool = true;

/// How to build a waveform view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    /// Rebuild geometry on a dedicated worker thread instead of inside
    /// the redraw call.
    pub threaded: bool,
    pub viewport: Viewport,
    pub look: LookAndFeel,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            threaded: DEFAULT_THREADED,
            viewport: Viewport::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
            look: LookAndFeel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_waits_for_layout() {
        let config = ViewConfig::default();
        assert!(config.threaded);
        assert!(config.viewport.is_empty());
        assert_eq!(config.look, LookAndFeel::default());
    }
}
