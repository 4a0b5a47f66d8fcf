use crate::{Bounds, Sdf};
use bevy::prelude::*;

/// Moves a field by `offset`.
pub struct Translate<S> {
	pub sdf: S,
	pub offset: Vec3,
}

impl<S: Sdf> Translate<S> {
	pub fn new(sdf: S, offset: Vec3) -> Self {
		Self { sdf, offset }
	}
}

impl<S: Sdf> Sdf for Translate<S> {
	fn distance(&self, p: Vec3) -> f32 {
		self.sdf.distance(p - self.offset)
	}

	fn bounds(&self) -> Option<Bounds> {
		self.sdf
			.bounds()
			.map(|b| Bounds { min: b.min + self.offset, max: b.max + self.offset })
	}
}

/// Hard union, the minimum of both fields.
pub struct Union<A, B> {
	pub a: A,
	pub b: B,
}

impl<A: Sdf, B: Sdf> Union<A, B> {
	pub fn new(a: A, b: B) -> Self {
		Self { a, b }
	}
}

impl<A: Sdf, B: Sdf> Sdf for Union<A, B> {
	fn distance(&self, p: Vec3) -> f32 {
		self.a.distance(p).min(self.b.distance(p))
	}

	fn bounds(&self) -> Option<Bounds> {
		Some(self.a.bounds()?.union(&self.b.bounds()?))
	}
}

/// Polynomial smooth union with blend radius `k`.
pub struct SmoothUnion<A, B> {
	pub a: A,
	pub b: B,
	pub k: f32,
}

impl<A: Sdf, B: Sdf> SmoothUnion<A, B> {
	pub fn new(a: A, b: B, k: f32) -> Self {
		Self { a, b, k }
	}
}

impl<A: Sdf, B: Sdf> Sdf for SmoothUnion<A, B> {
	fn distance(&self, p: Vec3) -> f32 {
		let d1 = self.a.distance(p);
		let d2 = self.b.distance(p);
		if self.k <= 0.0 {
			return d1.min(d2);
		}
		let h = (0.5 + 0.5 * (d2 - d1) / self.k).clamp(0.0, 1.0);
		d2 + (d1 - d2) * h - self.k * h * (1.0 - h)
	}

	// the blend can only swell the union by k / 4
	fn bounds(&self) -> Option<Bounds> {
		Some(self.a.bounds()?.union(&self.b.bounds()?).padded(self.k.max(0.0) * 0.25))
	}
}
