use crate::coords::SurfaceSize;
use crate::paint::{Color, FilterQuality};
use crate::resources::DEFAULT_KEY_PRECISION;

/// Engine construction options.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Color [`RenderEngine::frame`](super::RenderEngine::frame) clears to.
    pub clear_color: Color,
    /// Decimal places of gradient coordinates in brush cache keys.
    pub gradient_key_precision: usize,
    /// Glow quality used when the caller does not pass a paint.
    pub default_glow_quality: FilterQuality,
    /// First surface size. `None` asks the provider for its drawable size.
    pub initial_size: Option<SurfaceSize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::from_srgb_u8(12, 12, 16, 255),
            gradient_key_precision: DEFAULT_KEY_PRECISION,
            default_glow_quality: FilterQuality::Medium,
            initial_size: None,
        }
    }
}
