//! Particle field: procedural shapes and the per-frame animation engine
//!
//! Shape selection flows straight into the field; the gesture signal arrives
//! from the live session as a plain value each frame.

pub mod color;
mod field;
pub mod shape;

#[cfg(test)]
mod proptests;

pub use field::{ParticleField, PointCloud};
pub use shape::Shape;

/// Read-only consumer of the rendered cloud, invoked once per displayed frame
pub trait RenderSurface: Send {
    fn present(&mut self, cloud: &PointCloud<'_>);
}
