use crate::coords::{Rect, SurfaceSize};

/// What a frame does after the swap chain refused a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum AcquireFailure {
    /// Target and everything created on it must be rebuilt.
    Recreate,
    /// Reconfigure the swap chain and drop this frame.
    Reconfigure,
    /// Transient; drop this frame.
    Skip,
}

pub(crate) fn classify_surface_error(err: &wgpu::SurfaceError) -> AcquireFailure {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::OutOfMemory => AcquireFailure::Recreate,
        wgpu::SurfaceError::Outdated => AcquireFailure::Reconfigure,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => AcquireFailure::Skip,
    }
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = preferred.into_iter().find(|f| caps.formats.contains(f)) {
            return Some(f);
        }
    }
    caps.formats.first().copied()
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Scissor rectangle in physical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Scissor {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Scissor {
    pub fn full(size: SurfaceSize) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.width.max(1),
            height: size.height.max(1),
        }
    }
}

/// Converts a device-space clip to scissor arguments clamped to the surface.
///
/// `None` means unclipped. Returns `None` when nothing would be visible, in
/// which case the draw is skipped.
pub(crate) fn clip_to_scissor(clip: Option<Rect>, size: SurfaceSize) -> Option<Scissor> {
    let Some(r) = clip else {
        return Some(Scissor::full(size));
    };
    let (vw, vh) = (size.width.max(1), size.height.max(1));
    let r = r.normalized();
    let min = r.min();
    let max = r.max();
    let x = (min.x.floor().max(0.0) as u32).min(vw);
    let y = (min.y.floor().max(0.0) as u32).min(vh);
    let x2 = (max.x.ceil().max(0.0) as u32).min(vw);
    let y2 = (max.y.ceil().max(0.0) as u32).min(vh);

    let (width, height) = (x2.saturating_sub(x), y2.saturating_sub(y));
    if width == 0 || height == 0 {
        None
    } else {
        Some(Scissor { x, y, width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: SurfaceSize = SurfaceSize::new(100, 50);

    #[test]
    fn swap_chain_errors_map_to_frame_outcomes() {
        use wgpu::SurfaceError as E;
        assert_eq!(classify_surface_error(&E::Lost), AcquireFailure::Recreate);
        assert_eq!(classify_surface_error(&E::OutOfMemory), AcquireFailure::Recreate);
        assert_eq!(classify_surface_error(&E::Outdated), AcquireFailure::Reconfigure);
        assert_eq!(classify_surface_error(&E::Timeout), AcquireFailure::Skip);
        assert_eq!(classify_surface_error(&E::Other), AcquireFailure::Skip);
    }

    #[test]
    fn no_clip_covers_the_surface() {
        assert_eq!(clip_to_scissor(None, SIZE), Some(Scissor::full(SIZE)));
    }

    #[test]
    fn clip_is_clamped_and_rounded_outward() {
        let s = clip_to_scissor(Some(Rect::new(-10.0, 10.5, 200.0, 9.2)), SIZE);
        assert_eq!(s, Some(Scissor { x: 0, y: 10, width: 100, height: 10 }));
    }

    #[test]
    fn offscreen_or_empty_clip_skips_the_draw() {
        assert_eq!(clip_to_scissor(Some(Rect::new(200.0, 0.0, 10.0, 10.0)), SIZE), None);
        assert_eq!(clip_to_scissor(Some(Rect::default()), SIZE), None);
    }
}
