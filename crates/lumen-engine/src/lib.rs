//! Lumen engine crate.
//!
//! A 2D vector-drawing engine for audio visualisers. The [`engine::RenderEngine`]
//! owns the rendering surface and recreates it after device loss; every
//! component caching surface resources is told about each transition.
//! Visuals draw through a [`canvas::Canvas`] and never hold surface objects.
//!
//! The headless recording backend is always built. The `gpu` feature adds the
//! wgpu backend and a winit window runtime.

pub mod coords;
pub mod geometry;
pub mod paint;
pub mod text;

pub mod device;
pub mod lifecycle;
pub mod resources;
pub mod transform;

pub mod canvas;
pub mod engine;
pub mod render;
pub mod spectrum;

pub mod logging;

#[cfg(feature = "gpu")]
pub mod core;
#[cfg(feature = "gpu")]
pub mod time;
#[cfg(feature = "gpu")]
pub mod window;
