use crate::{Bounds, Sdf};
use bevy::prelude::*;

// ============================================================================
// Sphere
// ============================================================================

pub struct SphereSdf {
	pub center: Vec3,
	pub radius: f32,
}

impl SphereSdf {
	pub fn new(center: Vec3, radius: f32) -> Self {
		Self { center, radius }
	}
}

impl Sdf for SphereSdf {
	fn distance(&self, p: Vec3) -> f32 {
		p.distance(self.center) - self.radius
	}

	fn bounds(&self) -> Option<Bounds> {
		Some(Bounds::centered(self.center, Vec3::splat(self.radius)))
	}
}

// ============================================================================
// Torus
// ============================================================================

/// Torus lying in the xz plane.
pub struct TorusSdf {
	pub center: Vec3,
	pub major_radius: f32,
	pub minor_radius: f32,
}

impl TorusSdf {
	pub fn new(center: Vec3, major_radius: f32, minor_radius: f32) -> Self {
		Self { center, major_radius, minor_radius }
	}
}

impl Sdf for TorusSdf {
	fn distance(&self, p: Vec3) -> f32 {
		let q = p - self.center;
		let ring = Vec2::new(q.xz().length() - self.major_radius, q.y);
		ring.length() - self.minor_radius
	}

	fn bounds(&self) -> Option<Bounds> {
		let reach = self.major_radius + self.minor_radius;
		Some(Bounds::centered(self.center, Vec3::new(reach, self.minor_radius, reach)))
	}
}

// ============================================================================
// Rounded box
// ============================================================================

/// Box with half extents `half_extent` whose edges are rounded by `radius`.
///
/// The rounding eats into the box, so the outer extent stays `half_extent`.
pub struct RoundBoxSdf {
	pub center: Vec3,
	pub half_extent: Vec3,
	pub radius: f32,
}

impl RoundBoxSdf {
	pub fn new(center: Vec3, half_extent: Vec3, radius: f32) -> Self {
		Self { center, half_extent, radius }
	}
}

impl Sdf for RoundBoxSdf {
	fn distance(&self, p: Vec3) -> f32 {
		let q = (p - self.center).abs() - self.half_extent + Vec3::splat(self.radius);
		q.max(Vec3::ZERO).length() + q.max_element().min(0.0) - self.radius
	}

	fn bounds(&self) -> Option<Bounds> {
		Some(Bounds::centered(self.center, self.half_extent))
	}
}

// ============================================================================
// Capsule
// ============================================================================

/// Capsule around the segment `start..end`.
pub struct CapsuleSdf {
	pub start: Vec3,
	pub end: Vec3,
	pub radius: f32,
}

impl CapsuleSdf {
	pub fn new(start: Vec3, end: Vec3, radius: f32) -> Self {
		Self { start, end, radius }
	}
}

impl Sdf for CapsuleSdf {
	fn distance(&self, p: Vec3) -> f32 {
		let axis = self.end - self.start;
		let length_squared = axis.length_squared();
		let t = if length_squared > 0.0 {
			((p - self.start).dot(axis) / length_squared).clamp(0.0, 1.0)
		} else {
			0.0
		};
		p.distance(self.start + axis * t) - self.radius
	}

	fn bounds(&self) -> Option<Bounds> {
		Some(Bounds::new(self.start.min(self.end), self.start.max(self.end)).padded(self.radius))
	}
}

// ============================================================================
// Ellipsoid
// ============================================================================

/// Axis-aligned ellipsoid.
///
/// The distance is the usual first order bound, exact only on the surface.
pub struct EllipsoidSdf {
	pub center: Vec3,
	pub radii: Vec3,
}

impl EllipsoidSdf {
	pub fn new(center: Vec3, radii: Vec3) -> Self {
		Self { center, radii }
	}
}

impl Sdf for EllipsoidSdf {
	fn distance(&self, p: Vec3) -> f32 {
		let q = p - self.center;
		let k0 = (q / self.radii).length();
		let k1 = (q / (self.radii * self.radii)).length();
		if k1 == 0.0 {
			return -self.radii.min_element();
		}
		k0 * (k0 - 1.0) / k1
	}

	fn bounds(&self) -> Option<Bounds> {
		Some(Bounds::centered(self.center, self.radii))
	}
}
