//! Procedural point clouds for each selectable shape
//!
//! Generation is pure given its random source and runs once per shape change,
//! never per frame.

use super::color::{hsl_to_rgb, Rgb};
use rand::Rng;
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Uniform scale applied to the raw heart curve
const HEART_SCALE: f32 = 0.5;

/// Half-depth of the heart before scaling
const HEART_THICKNESS: f32 = 2.5;

/// Heart hues start at pink and wrap through red
const HEART_HUE_START: f32 = 0.95;
const HEART_HUE_SPAN: f32 = 0.1;

/// Radius of the firework shell
pub const FIREWORK_RADIUS: f32 = 10.0;

const SATURATION: f32 = 1.0;
const LIGHTNESS: f32 = 0.5;

/// Selectable particle shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shape {
    #[default]
    Heart,
    Firework,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Heart => "HEART",
            Shape::Firework => "FIREWORK",
        }
    }

    /// One base position for this shape
    fn sample_position<R: Rng + ?Sized>(self, rng: &mut R) -> [f32; 3] {
        match self {
            Shape::Heart => heart_point(rng),
            Shape::Firework => sphere_point(rng, FIREWORK_RADIUS),
        }
    }

    /// One colour for this shape
    fn sample_color<R: Rng + ?Sized>(self, rng: &mut R) -> Rgb {
        let hue = match self {
            Shape::Heart => HEART_HUE_START + rng.gen::<f32>() * HEART_HUE_SPAN,
            Shape::Firework => rng.gen::<f32>(),
        };
        hsl_to_rgb(hue, SATURATION, LIGHTNESS)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heart" => Ok(Shape::Heart),
            "firework" | "fireworks" => Ok(Shape::Firework),
            other => Err(format!("unknown shape: {other}")),
        }
    }
}

/// Base positions and colours for one shape, index-aligned, 3 floats per particle
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeCloud {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
}

impl ShapeCloud {
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    #[allow(dead_code)] // API completeness
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of particle `index`
    pub fn position(&self, index: usize) -> [f32; 3] {
        let i = index * 3;
        [self.positions[i], self.positions[i + 1], self.positions[i + 2]]
    }

    /// Colour of particle `index`
    pub fn color(&self, index: usize) -> Rgb {
        let i = index * 3;
        [self.colors[i], self.colors[i + 1], self.colors[i + 2]]
    }
}

/// Generate `count` base positions and colours for `shape`
pub fn generate<R: Rng + ?Sized>(shape: Shape, count: usize, rng: &mut R) -> ShapeCloud {
    let mut positions = Vec::with_capacity(count * 3);
    let mut colors = Vec::with_capacity(count * 3);

    for _ in 0..count {
        positions.extend_from_slice(&shape.sample_position(rng));
        colors.extend_from_slice(&shape.sample_color(rng));
    }

    ShapeCloud { positions, colors }
}

/// Random point on the classic heart curve with random depth jitter.
///
/// The parameter is drawn uniformly rather than evenly spaced, which gives a
/// noisy but recognisable outline.
fn heart_point<R: Rng + ?Sized>(rng: &mut R) -> [f32; 3] {
    let t = rng.gen::<f32>() * TAU;
    let x = 16.0 * t.sin().powi(3);
    let y = 13.0 * t.cos() - 5.0 * (2.0 * t).cos() - 2.0 * (3.0 * t).cos() - (4.0 * t).cos();
    let z = rng.gen_range(-HEART_THICKNESS..=HEART_THICKNESS);
    [x * HEART_SCALE, y * HEART_SCALE, z * HEART_SCALE]
}

/// Area-uniform point on a sphere surface.
///
/// The polar angle comes from `acos(2v - 1)` so points do not cluster at the poles.
fn sphere_point<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> [f32; 3] {
    let theta = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    [
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    ]
}
