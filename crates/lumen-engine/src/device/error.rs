use std::fmt;

use super::Generation;

/// Failure reported by a surface or surface provider.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceError {
    /// The underlying device or swap chain is gone; the surface must be rebuilt.
    Lost,
    /// A handle from another surface generation was passed in.
    StaleHandle { handle: Generation, live: Generation },
    /// The surface cannot be created or resized to a zero area.
    EmptySize,
    /// Resource creation rejected the input.
    InvalidResource(String),
    /// Anything else the backend reports.
    Backend(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::Lost => write!(f, "surface lost"),
            SurfaceError::StaleHandle { handle, live } => {
                write!(f, "stale handle from {handle} (live surface is {live})")
            }
            SurfaceError::EmptySize => write!(f, "surface size is empty"),
            SurfaceError::InvalidResource(msg) => write!(f, "invalid resource: {msg}"),
            SurfaceError::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// Result of closing a frame on a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum EndDrawStatus {
    Ok,
    /// The target is unusable; every resource created against it is invalid.
    RecreateTarget,
    /// The frame was dropped but the surface is still usable.
    Failed(SurfaceError),
}
