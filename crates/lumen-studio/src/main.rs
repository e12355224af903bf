mod demo;
mod synthetic;

use anyhow::Result;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::text::{FontStyle, FontSystem, FontWeight};
use lumen_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

use crate::demo::Studio;
use crate::synthetic::{SyntheticSpectrum, XorShiftNoise};

const SPECTRUM_BANDS: usize = 64;
const NOISE_SEED: u64 = 0x5EED_CAFE_F00D_0001;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default().with_filter(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,wgpu_core=warn,wgpu_hal=warn".into()),
    ));

    let fonts = load_fonts();
    let spectrum = SyntheticSpectrum::new(SPECTRUM_BANDS, Box::new(XorShiftNoise::new(NOISE_SEED)));

    let config = RuntimeConfig {
        title: "Lumen Studio".to_string(),
        initial_size: LogicalSize::new(1100.0, 640.0),
        ..RuntimeConfig::default()
    };
    Runtime::run(config, fonts, Studio::new(spectrum))
}

fn load_fonts() -> FontSystem {
    let mut fonts = FontSystem::new();
    let found = [
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\segoeui.ttf",
    ]
    .iter()
    .find_map(|p| std::fs::read(p).ok());

    match found {
        Some(bytes) => {
            if let Err(e) = fonts.load_font("sans", FontWeight::NORMAL, FontStyle::Normal, &bytes) {
                log::warn!("system font rejected: {e}");
            }
        }
        None => log::warn!("no system font found; text will not be drawn"),
    }
    fonts
}
