//! Particle field engine
//!
//! Holds the base cloud for the current shape and a single render buffer that
//! is rewritten in place every frame. The engine is the only writer of that
//! buffer; renderers borrow it read-only through [`PointCloud`].

use super::shape::{generate, Shape, ShapeCloud};
use crate::gesture::GestureSignal;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Number of particles in the ensemble
pub const PARTICLE_COUNT: usize = 3000;

/// Exponential smoothing rate per second (about five half-lives per second)
pub const SMOOTHING_RATE: f32 = 5.0;

/// Scale a freshly created field starts from
pub const INITIAL_SCALE: f32 = 1.0;

/// Amplitude of the per-particle shimmer, added after scaling
pub const SHIMMER_AMPLITUDE: f32 = 0.2;

/// Angular frequency of the shimmer in radians per second
pub const SHIMMER_FREQUENCY: f32 = 2.0;

/// Ambient rotation about the vertical axis in radians per second
pub const ROTATION_SPEED: f32 = 0.1;

/// Material hints for drawing the cloud
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMaterial {
    pub size: f32,
    pub opacity: f32,
    pub additive_blending: bool,
    pub size_attenuation: bool,
}

impl Default for PointMaterial {
    fn default() -> Self {
        Self {
            size: 0.2,
            opacity: 0.8,
            additive_blending: true,
            size_attenuation: true,
        }
    }
}

/// Read-only view of the field handed to a renderer once per frame
#[derive(Debug, Clone, Copy)]
pub struct PointCloud<'a> {
    pub positions: &'a [f32],
    pub colors: &'a [f32],
    /// Rotation of the whole ensemble about the y axis, in radians
    pub rotation_y: f32,
    pub material: PointMaterial,
}

/// Current and target scale of the ensemble
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub current_scale: f32,
    pub target_scale: f32,
}

impl AnimationState {
    pub fn new(initial_scale: f32) -> Self {
        Self {
            current_scale: initial_scale,
            target_scale: initial_scale,
        }
    }

    /// Move the current scale toward `target` for a frame of `dt` seconds.
    ///
    /// The blend factor is capped at 1, so the scale never overshoots the target.
    pub fn step(&mut self, target: f32, dt: f32) -> f32 {
        self.target_scale = target;
        let alpha = (SMOOTHING_RATE * dt.max(0.0)).min(1.0);
        self.current_scale += (target - self.current_scale) * alpha;
        self.current_scale
    }
}

/// Shimmer phase at `elapsed` seconds, reduced to one turn before narrowing
#[allow(clippy::cast_possible_truncation)] // reduced to [0, TAU) first
fn shimmer_phase(elapsed: f64) -> f32 {
    (f64::from(SHIMMER_FREQUENCY) * elapsed).rem_euclid(std::f64::consts::TAU) as f32
}

/// Fixed-size particle ensemble animated by the gesture signal
pub struct ParticleField<R: Rng = StdRng> {
    shape: Shape,
    count: usize,
    base: ShapeCloud,
    render: Vec<f32>,
    animation: AnimationState,
    /// f64 so the shimmer stays smooth on sessions that run for days
    elapsed: f64,
    rotation_y: f32,
    rng: R,
}

impl ParticleField<StdRng> {
    /// Full-size field seeded from OS entropy
    pub fn new(shape: Shape) -> Self {
        Self::with_rng(shape, PARTICLE_COUNT, StdRng::from_entropy())
    }
}

impl<R: Rng> ParticleField<R> {
    pub fn with_rng(shape: Shape, count: usize, mut rng: R) -> Self {
        let base = generate(shape, count, &mut rng);
        let render = base.positions.clone();
        Self {
            shape,
            count,
            base,
            render,
            animation: AnimationState::new(INITIAL_SCALE),
            elapsed: 0.0,
            rotation_y: 0.0,
            rng,
        }
    }

    /// Regenerate the whole ensemble for `shape` and reset the render buffer to it.
    ///
    /// Scale, elapsed time and rotation carry over so the switch does not jump.
    pub fn set_shape(&mut self, shape: Shape) {
        self.base = generate(shape, self.count, &mut self.rng);
        self.render.clear();
        self.render.extend_from_slice(&self.base.positions);
        self.shape = shape;
        tracing::debug!(shape = %shape, count = self.count, "Regenerated particle field");
    }

    /// Advance the animation by `dt` seconds under `gesture`.
    ///
    /// O(N) and allocation free: the render buffer is rewritten in place.
    pub fn update(&mut self, dt: f32, gesture: GestureSignal) {
        let dt = dt.max(0.0);
        self.elapsed += f64::from(dt);
        let scale = self.animation.step(gesture.target_scale(), dt);
        let phase = shimmer_phase(self.elapsed);

        for (i, (out, base)) in self
            .render
            .chunks_exact_mut(3)
            .zip(self.base.positions.chunks_exact(3))
            .enumerate()
        {
            let shimmer = SHIMMER_AMPLITUDE * (phase + i as f32).sin();
            out[0] = base[0] * scale + shimmer;
            out[1] = base[1] * scale + shimmer;
            out[2] = base[2] * scale + shimmer;
        }

        self.rotation_y = (self.rotation_y + dt * ROTATION_SPEED).rem_euclid(TAU);
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.count
    }

    #[allow(dead_code)] // API completeness
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn animation(&self) -> AnimationState {
        self.animation
    }

    pub fn scale(&self) -> f32 {
        self.animation.current_scale
    }

    /// Seconds of animation time since the field was created
    #[cfg(test)]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    #[cfg(test)]
    pub fn base(&self) -> &ShapeCloud {
        &self.base
    }

    pub fn positions(&self) -> &[f32] {
        &self.render
    }

    pub fn colors(&self) -> &[f32] {
        &self.base.colors
    }

    pub fn point_cloud(&self) -> PointCloud<'_> {
        PointCloud {
            positions: &self.render,
            colors: &self.base.colors,
            rotation_y: self.rotation_y,
            material: PointMaterial::default(),
        }
    }
}
