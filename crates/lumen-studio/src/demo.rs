//! The visuals shown by the studio window.

use lumen_engine::canvas::Canvas;
use lumen_engine::coords::{Rect, Vec2};
use lumen_engine::core::{App, AppControl};
use lumen_engine::engine::FrameOutcome;
use lumen_engine::paint::{even_stops, Color, DashStyle, FilterQuality, LineCap, Paint};
use lumen_engine::spectrum::{BarStyle, WaveformStyle};
use lumen_engine::text::{FontWeight, TextAlignment, TextStyle};
use lumen_engine::time::FrameTime;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::synthetic::SyntheticSpectrum;

const MARGIN: f32 = 24.0;
const WAVEFORM_SAMPLES: usize = 256;

pub struct Studio {
    spectrum: SyntheticSpectrum,
    accent: Color,
    bars: BarStyle,
    wave: Paint,
    wave_style: WaveformStyle,
    scale: Paint,
    ring: Paint,
    title: TextStyle,
    caption: TextStyle,
    surfaces_lost: u32,
}

impl Studio {
    pub fn new(spectrum: SyntheticSpectrum) -> Self {
        let accent = Color::from_hex(0x4FC3F7FF);
        let bars = BarStyle {
            spacing: 3.0,
            corner_radius: 2.0,
            gradient: Some(even_stops(&[
                Color::from_hex(0x1A237EFF),
                accent,
                Color::from_hex(0xF06292FF),
            ])),
            color: accent,
        };
        Self {
            spectrum,
            accent,
            bars,
            wave: Paint::stroke(accent, 2.0).with_cap(LineCap::Round),
            wave_style: WaveformStyle { mirror: true, mirror_alpha: 0.3 },
            scale: Paint::stroke(Color::from_hex(0xFFFFFF26), 1.0).with_dash(DashStyle::Dash),
            ring: Paint::stroke(accent, 1.0).with_quality(FilterQuality::High),
            title: TextStyle::new("sans", 22.0)
                .with_weight(FontWeight::SEMI_BOLD)
                .with_color(Color::WHITE),
            caption: TextStyle::new("sans", 13.0)
                .with_alignment(TextAlignment::Trailing)
                .with_color(Color::from_hex(0xFFFFFF99)),
            surfaces_lost: 0,
        }
    }

    /// Draws one frame of every visual at time `t`.
    pub fn draw(&mut self, canvas: &mut Canvas<'_>, t: f32) {
        self.spectrum.update(t);

        let size = canvas.surface_size();
        let (w, h) = (size.width as f32, size.height as f32);
        if w <= 2.0 * MARGIN || h <= 2.0 * MARGIN {
            return;
        }

        let header = Rect::new(MARGIN, MARGIN * 0.5, w - 2.0 * MARGIN, 32.0);
        canvas.draw_text("lumen studio", header, &self.title);
        let caption = format!("surfaces lost: {}", self.surfaces_lost);
        canvas.draw_text(&caption, header, &self.caption);

        // Bottom half: bars over a dashed scale.
        let bars = Rect::new(MARGIN, h * 0.5, w - 2.0 * MARGIN, h * 0.5 - MARGIN);
        canvas.draw_spectrum_scale(bars, 4, &self.scale);
        canvas.draw_bars(bars, &self.spectrum, &self.bars);

        // Top left: mirrored waveform.
        let wave = Rect::new(MARGIN, 64.0, w * 0.6 - MARGIN, h * 0.5 - 64.0 - MARGIN);
        let samples = self.spectrum.waveform(t, WAVEFORM_SAMPLES);
        canvas.draw_waveform(wave, &samples, &self.wave, &self.wave_style);

        // Top right: pulsing glow with rotating rings.
        let bass = self.spectrum.bass();
        let center = Vec2::new(w * 0.8, h * 0.27);
        let radius = (h * 0.16).min(w * 0.12);
        canvas.draw_glow_paint(
            center,
            radius * (0.8 + 0.4 * bass),
            &self.ring.with_color(self.accent.scale_alpha(0.5 + 0.5 * bass)),
        );

        canvas.with_layer(0.85, |c| {
            if c.push_transform() {
                c.rotate_at(t * 30.0, center);
                let ring = Paint::fill(self.accent.scale_alpha(0.6));
                c.draw_ring(center, radius * 0.9, radius, &ring);
                let star = self.ring.with_stroke_width(1.5);
                c.draw_star(center, radius * 0.7, radius * 0.35, 5, &star);
                c.pop_transform();
            }
            let meter = self.wave.with_stroke_width(4.0);
            c.draw_arc(center, radius * 1.15, -90.0, 360.0 * bass, &meter);
        });
    }
}

impl App for Studio {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, canvas: &mut Canvas<'_>, time: FrameTime) -> AppControl {
        self.draw(canvas, time.elapsed);
        AppControl::Continue
    }

    fn on_frame_end(&mut self, outcome: &FrameOutcome) {
        if *outcome == FrameOutcome::SurfaceLost {
            self.surfaces_lost += 1;
        }
    }
}
