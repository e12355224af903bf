//! Save/restore stack for the surface transform.

mod manager;

pub use manager::{TransformManager, MAX_TRANSFORM_DEPTH};
