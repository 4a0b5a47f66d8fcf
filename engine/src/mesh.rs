use crate::desc::BBox;
use crate::error::GenerationError;
use bevy::prelude::*;
use std::f32::consts::PI;

/// Triangle with counter-clockwise front face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
	pub a: Vec3,
	pub b: Vec3,
	pub c: Vec3,
}

impl Triangle {
	pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
		Self { a, b, c }
	}

	/// Unnormalized face normal.
	pub fn normal(&self) -> Vec3 {
		(self.b - self.a).cross(self.c - self.a)
	}

	pub fn flipped(&self) -> Self {
		Self { a: self.a, b: self.c, c: self.b }
	}

	/// Closest point of the triangle to `p`, after Ericson's Real-Time Collision Detection.
	pub fn closest_point(&self, p: Vec3) -> Vec3 {
		let ab = self.b - self.a;
		let ac = self.c - self.a;
		let ap = p - self.a;

		let d1 = ab.dot(ap);
		let d2 = ac.dot(ap);
		if d1 <= 0.0 && d2 <= 0.0 {
			return self.a;
		}

		let bp = p - self.b;
		let d3 = ab.dot(bp);
		let d4 = ac.dot(bp);
		if d3 >= 0.0 && d4 <= d3 {
			return self.b;
		}

		let vc = d1 * d4 - d3 * d2;
		if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
			return self.a + ab * (d1 / (d1 - d3));
		}

		let cp = p - self.c;
		let d5 = ab.dot(cp);
		let d6 = ac.dot(cp);
		if d6 >= 0.0 && d5 <= d6 {
			return self.c;
		}

		let vb = d5 * d2 - d1 * d6;
		if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
			return self.a + ac * (d2 / (d2 - d6));
		}

		let va = d3 * d6 - d5 * d4;
		if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
			let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
			return self.b + (self.c - self.b) * w;
		}

		let sum = va + vb + vc;
		if sum.abs() <= f32::EPSILON {
			// degenerate
			return self.a;
		}
		self.a + ab * (vb / sum) + ac * (vc / sum)
	}

	pub fn distance(&self, p: Vec3) -> f32 {
		p.distance(self.closest_point(p))
	}

	/// Signed solid angle the triangle subtends at `p` (Van Oosterom and Strackee).
	///
	/// Positive when `p` sees the back face. Summed over a closed CCW mesh it is `4π` inside
	/// and `0` outside.
	pub fn solid_angle(&self, p: Vec3) -> f32 {
		let a = self.a - p;
		let b = self.b - p;
		let c = self.c - p;
		let (la, lb, lc) = (a.length(), b.length(), c.length());

		let numerator = a.dot(b.cross(c));
		let denominator = la * lb * lc + a.dot(b) * lc + a.dot(c) * lb + b.dot(c) * la;
		2.0 * numerator.atan2(denominator)
	}

	/// Share of the winding number of `p` contributed by this triangle.
	pub fn winding(&self, p: Vec3) -> f32 {
		self.solid_angle(p) / (4.0 * PI)
	}
}

/// Unindexed triangle soup used as the input of mesh generations.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatMesh {
	pub name: String,
	pub triangles: Vec<Triangle>,
	pub min_corner: Vec3,
	pub max_corner: Vec3,
}

impl FlatMesh {
	/// Flattens an indexed mesh.
	///
	/// Meshes whose front face is clockwise get their winding reversed so every triangle ends up
	/// counter-clockwise. Trailing indices that don't form a full triangle are ignored.
	pub fn from_indexed(
		name: impl Into<String>,
		positions: &[Vec3],
		indices: &[u32],
		front_face_cw: bool,
	) -> Result<Self, GenerationError> {
		if indices.len() < 3 {
			return Err(GenerationError::EmptyMesh);
		}

		let vertex = |index: u32| {
			positions.get(index as usize).copied().ok_or(GenerationError::InvalidMeshIndex {
				index,
				vertex_count: positions.len(),
			})
		};

		let mut triangles = Vec::with_capacity(indices.len() / 3);
		let mut min_corner = Vec3::splat(f32::INFINITY);
		let mut max_corner = Vec3::splat(f32::NEG_INFINITY);
		for tri in indices.chunks_exact(3) {
			let triangle = Triangle::new(vertex(tri[0])?, vertex(tri[1])?, vertex(tri[2])?);
			for p in [triangle.a, triangle.b, triangle.c] {
				min_corner = min_corner.min(p);
				max_corner = max_corner.max(p);
			}
			triangles.push(if front_face_cw { triangle.flipped() } else { triangle });
		}

		Ok(Self { name: name.into(), triangles, min_corner, max_corner })
	}

	/// Axis-aligned cube with outward facing triangles.
	pub fn cube(name: impl Into<String>, center: Vec3, half_extent: f32) -> Self {
		let corners: Vec<Vec3> = (0..8u32)
			.map(|i| {
				let unit = Vec3::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32);
				center + (unit * 2.0 - Vec3::ONE) * half_extent
			})
			.collect();
		const QUADS: [[usize; 4]; 6] = [
			[0, 1, 3, 2],
			[4, 5, 7, 6],
			[0, 1, 5, 4],
			[2, 3, 7, 6],
			[0, 2, 6, 4],
			[1, 3, 7, 5],
		];
		let faces = QUADS.iter().flat_map(|[a, b, c, d]| [[*a, *b, *c], [*a, *c, *d]]);
		Self::convex(name, center, &corners, faces)
	}

	/// Regular octahedron with vertices on the axes at distance `radius`.
	pub fn octahedron(name: impl Into<String>, center: Vec3, radius: f32) -> Self {
		let corners: Vec<Vec3> = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z]
			.iter()
			.map(|axis| center + *axis * radius)
			.collect();
		let faces = [0usize, 1].into_iter().flat_map(|x| {
			[2usize, 3].into_iter().flat_map(move |y| [4usize, 5].into_iter().map(move |z| [x, y, z]))
		});
		Self::convex(name, center, &corners, faces)
	}

	/// Orients the faces of a convex polyhedron away from `center`.
	fn convex(
		name: impl Into<String>,
		center: Vec3,
		corners: &[Vec3],
		faces: impl Iterator<Item = [usize; 3]>,
	) -> Self {
		let triangles: Vec<Triangle> = faces
			.map(|[a, b, c]| {
				let triangle = Triangle::new(corners[a], corners[b], corners[c]);
				let outward = (triangle.a + triangle.b + triangle.c) / 3.0 - center;
				if triangle.normal().dot(outward) < 0.0 {
					triangle.flipped()
				} else {
					triangle
				}
			})
			.collect();
		let min_corner = corners.iter().fold(Vec3::splat(f32::INFINITY), |m, p| m.min(*p));
		let max_corner = corners.iter().fold(Vec3::splat(f32::NEG_INFINITY), |m, p| m.max(*p));
		Self { name: name.into(), triangles, min_corner, max_corner }
	}

	pub fn triangle_count(&self) -> u32 {
		self.triangles.len() as u32
	}

	pub fn bounds(&self) -> BBox {
		BBox::from_min_max(self.min_corner, self.max_corner)
	}

	/// Winding number of `p`, close to 1 inside a closed mesh and 0 outside.
	pub fn winding_number(&self, p: Vec3) -> f32 {
		self.triangles.iter().map(|triangle| triangle.winding(p)).sum()
	}

	/// Unsigned distance from `p` to the closest triangle.
	pub fn distance(&self, p: Vec3) -> f32 {
		self.triangles.iter().map(|triangle| triangle.distance(p)).fold(f32::INFINITY, f32::min)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_closest_point_regions() -> Result<(), String> {
		let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y);
		assert_eq!(tri.closest_point(Vec3::new(-1.0, -1.0, 0.0)), Vec3::ZERO);
		assert_eq!(tri.closest_point(Vec3::new(2.0, 0.0, 0.0)), Vec3::X);
		assert_eq!(tri.closest_point(Vec3::new(0.5, -1.0, 0.0)), Vec3::new(0.5, 0.0, 0.0));
		assert_eq!(tri.closest_point(Vec3::new(0.25, 0.25, 3.0)), Vec3::new(0.25, 0.25, 0.0));
		assert!((tri.distance(Vec3::new(0.25, 0.25, -2.0)) - 2.0).abs() < 1e-6);

		let hyp = tri.closest_point(Vec3::new(1.0, 1.0, 0.0));
		assert!(hyp.abs_diff_eq(Vec3::new(0.5, 0.5, 0.0), 1e-6));
		Ok(())
	}

	#[test]
	fn test_degenerate_triangle_has_a_closest_point() -> Result<(), String> {
		let tri = Triangle::new(Vec3::ONE, Vec3::ONE, Vec3::ONE);
		assert_eq!(tri.closest_point(Vec3::ZERO), Vec3::ONE);
		Ok(())
	}

	#[test]
	fn test_from_indexed_needs_a_triangle() -> Result<(), String> {
		let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
		assert_eq!(
			FlatMesh::from_indexed("tri", &positions, &[0, 1], false),
			Err(GenerationError::EmptyMesh)
		);
		assert_eq!(
			FlatMesh::from_indexed("tri", &positions, &[0, 1, 7], false),
			Err(GenerationError::InvalidMeshIndex { index: 7, vertex_count: 3 })
		);
		Ok(())
	}

	#[test]
	fn test_from_indexed_fixes_clockwise_winding() -> Result<(), String> {
		let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(2.0, 2.0, 2.0)];
		let ccw = FlatMesh::from_indexed("tri", &positions, &[0, 1, 2, 3], false)
			.map_err(|e| e.to_string())?;
		let cw = FlatMesh::from_indexed("tri", &positions, &[0, 2, 1], true)
			.map_err(|e| e.to_string())?;

		assert_eq!(ccw.triangle_count(), 1);
		assert_eq!(ccw.triangles[0].normal(), Vec3::Z);
		assert_eq!(cw.triangles[0].normal(), Vec3::Z);
		assert_eq!(ccw.min_corner, Vec3::ZERO);
		assert_eq!(ccw.max_corner, Vec3::new(1.0, 1.0, 0.0));
		Ok(())
	}

	#[test]
	fn test_demo_meshes_are_closed_and_outward() -> Result<(), String> {
		for mesh in [
			FlatMesh::cube("cube", Vec3::new(0.5, 0.0, 0.0), 1.0),
			FlatMesh::octahedron("octahedron", Vec3::new(0.5, 0.0, 0.0), 1.0),
		] {
			let inside = mesh.winding_number(Vec3::new(0.6, 0.1, -0.1));
			let outside = mesh.winding_number(Vec3::new(3.0, 2.0, 1.0));
			if (inside - 1.0).abs() > 1e-3 || outside.abs() > 1e-3 {
				return Err(format!("{} winds {inside} inside and {outside} outside", mesh.name));
			}
		}

		let cube = FlatMesh::cube("cube", Vec3::ZERO, 1.0);
		assert_eq!(cube.triangle_count(), 12);
		assert_eq!(cube.bounds(), BBox::new(Vec3::NEG_ONE, Vec3::splat(2.0)));
		assert!((cube.distance(Vec3::new(3.0, 0.0, 0.0)) - 2.0).abs() < 1e-6);
		assert!((cube.distance(Vec3::new(0.25, 0.0, 0.0)) - 0.75).abs() < 1e-6);
		Ok(())
	}
}
