pub mod combinators;
pub mod shapes;

pub use combinators::{SmoothUnion, Translate, Union};
pub use shapes::{CapsuleSdf, EllipsoidSdf, RoundBoxSdf, SphereSdf, TorusSdf};

use bevy::prelude::*;

/// Trait for Signed Distance Fields
/// Returns the signed distance from a point to the surface:
/// - Negative: inside the surface
/// - Zero: on the surface
/// - Positive: outside the surface
pub trait Sdf: Send + Sync {
	fn distance(&self, p: Vec3) -> f32;

	/// Axis-aligned region that contains every point where the field is negative.
	///
	/// `None` means the field doesn't know a finite region, e.g. a half space.
	fn bounds(&self) -> Option<Bounds> {
		None
	}
}

/// Closed axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
	pub min: Vec3,
	pub max: Vec3,
}

impl Bounds {
	pub fn new(min: Vec3, max: Vec3) -> Self {
		Self { min: min.min(max), max: min.max(max) }
	}

	pub fn centered(center: Vec3, half_extent: Vec3) -> Self {
		Self::new(center - half_extent, center + half_extent)
	}

	pub fn size(&self) -> Vec3 {
		self.max - self.min
	}

	pub fn union(&self, other: &Bounds) -> Bounds {
		Bounds { min: self.min.min(other.min), max: self.max.max(other.max) }
	}

	/// Grows the box by `margin` on every side.
	pub fn padded(&self, margin: f32) -> Bounds {
		Bounds { min: self.min - Vec3::splat(margin), max: self.max + Vec3::splat(margin) }
	}
}
