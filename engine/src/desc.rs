use crate::mesh::FlatMesh;
use bevy::prelude::*;
use sdf::Sdf;
use std::fmt;
use std::sync::Arc;

/// How a field stores its distances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldKind {
	/// Order-0 grid, one distance per voxel.
	#[default]
	Sampled,
	/// A function evaluated on demand inside the bounding box.
	Procedural,
}

/// Where the distances of a new field come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceKind {
	/// Resample the previously generated field.
	ResampleField,
	/// Evaluate a procedural function.
	ProceduralFunction,
	/// Compute distances to a triangle mesh.
	#[default]
	MeshCalc,
}

/// Axis-aligned box given by its minimum corner and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
	pub corner: Vec3,
	pub size: Vec3,
}

impl Default for BBox {
	fn default() -> Self {
		Self { corner: Vec3::splat(-0.5), size: Vec3::ONE }
	}
}

impl BBox {
	pub fn new(corner: Vec3, size: Vec3) -> Self {
		Self { corner, size }
	}

	pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
		Self { corner: min, size: max - min }
	}

	pub fn max_corner(&self) -> Vec3 {
		self.corner + self.size
	}

	pub fn center(&self) -> Vec3 {
		self.corner + self.size * 0.5
	}

	/// Size of a single voxel when the box is split into `resolution` cells.
	pub fn cell_size(&self, resolution: UVec3) -> Vec3 {
		self.size / resolution.as_vec3()
	}

	/// Box spanned by the voxel centres, i.e. shrunk by half a cell on every side.
	pub fn inner_box(&self, resolution: UVec3) -> BBox {
		let res_r = Vec3::ONE / resolution.as_vec3();
		BBox { corner: self.corner + 0.5 * res_r * self.size, size: self.size * (Vec3::ONE - res_r) }
	}

	/// World position of the centre of voxel `coord`.
	pub fn voxel_center(&self, coord: UVec3, resolution: UVec3) -> Vec3 {
		self.corner + (coord.as_vec3() + 0.5) / resolution.as_vec3() * self.size
	}

	/// Grows the box by `ratio` of its size on every side.
	pub fn padded(&self, ratio: f32) -> BBox {
		let margin = self.size * ratio;
		BBox { corner: self.corner - margin, size: self.size + 2.0 * margin }
	}
}

/// Storage description of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDataDesc {
	pub kind: FieldKind,
	pub half_precision: bool,
	pub resolution: UVec3,
	pub bbox: BBox,
}

impl Default for FieldDataDesc {
	fn default() -> Self {
		Self {
			kind: FieldKind::Sampled,
			half_precision: false,
			resolution: UVec3::splat(64),
			bbox: BBox::default(),
		}
	}
}

/// A named distance function with the box it lives in.
#[derive(Clone)]
pub struct ProceduralSdf {
	pub name: String,
	pub bbox: BBox,
	pub function: Arc<dyn Sdf>,
}

impl ProceduralSdf {
	pub fn new(name: impl Into<String>, bbox: BBox, function: impl Sdf + 'static) -> Self {
		Self { name: name.into(), bbox, function: Arc::new(function) }
	}

	/// Uses the function's own bounds, grown by `padding` of their size, as the box.
	pub fn bounded(name: impl Into<String>, function: impl Sdf + 'static, padding: f32) -> Self {
		let bbox = function
			.bounds()
			.map(|b| BBox::from_min_max(b.min, b.max).padded(padding))
			.unwrap_or_default();
		Self::new(name, bbox, function)
	}

	pub fn distance(&self, p: Vec3) -> f32 {
		self.function.distance(p)
	}
}

impl fmt::Debug for ProceduralSdf {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProceduralSdf")
			.field("name", &self.name)
			.field("bbox", &self.bbox)
			.finish_non_exhaustive()
	}
}

/// The procedural functions a user can pick from.
#[derive(Debug, Clone, Default)]
pub struct ProceduralCatalog {
	pub entries: Vec<ProceduralSdf>,
	pub active_index: usize,
}

impl ProceduralCatalog {
	/// A small set of primitive shapes.
	pub fn builtin() -> Self {
		let entries = vec![
			ProceduralSdf::bounded("sphere", sdf::SphereSdf::new(Vec3::ZERO, 0.5), 0.1),
			ProceduralSdf::bounded("torus", sdf::TorusSdf::new(Vec3::ZERO, 0.5, 0.15), 0.1),
			ProceduralSdf::bounded(
				"rounded box",
				sdf::RoundBoxSdf::new(Vec3::ZERO, Vec3::new(0.5, 0.3, 0.4), 0.08),
				0.1,
			),
			ProceduralSdf::bounded(
				"capsule blob",
				sdf::SmoothUnion::new(
					sdf::CapsuleSdf::new(Vec3::new(-0.4, 0.0, 0.0), Vec3::new(0.4, 0.0, 0.0), 0.15),
					sdf::EllipsoidSdf::new(Vec3::new(0.0, 0.2, 0.0), Vec3::new(0.25, 0.2, 0.3)),
					0.1,
				),
				0.1,
			),
		];
		Self { entries, active_index: 0 }
	}

	pub fn push(&mut self, entry: ProceduralSdf) -> usize {
		self.entries.push(entry);
		self.entries.len() - 1
	}

	pub fn active(&self) -> Option<&ProceduralSdf> {
		self.entries.get(self.active_index)
	}

	/// Selects the entry called `name`, returning whether it exists.
	pub fn select(&mut self, name: &str) -> bool {
		match self.entries.iter().position(|entry| entry.name == name) {
			Some(index) => {
				self.active_index = index;
				true
			}
			None => false,
		}
	}
}

/// Inputs of the next generation.
#[derive(Debug, Clone, Default)]
pub struct SourceDesc {
	pub kind: SourceKind,
	pub mesh: Option<Arc<FlatMesh>>,
	pub procedural: Option<ProceduralSdf>,
}

/// Everything needed to start a generation.
#[derive(Debug, Clone)]
pub struct GenerationDesc {
	pub data: FieldDataDesc,
	pub source: SourceDesc,
	/// Voxels covered by one chunk dispatch.
	pub output_voxel_size: UVec3,
	/// Fork the session before generating so the current field survives.
	pub keep_source: bool,
}

impl Default for GenerationDesc {
	fn default() -> Self {
		Self {
			data: FieldDataDesc::default(),
			source: SourceDesc::default(),
			output_voxel_size: UVec3::splat(64),
			keep_source: false,
		}
	}
}

impl GenerationDesc {
	/// Copy of the description without references to source data.
	pub fn detached(&self) -> Self {
		Self {
			data: self.data.clone(),
			source: SourceDesc { kind: self.source.kind, mesh: None, procedural: None },
			output_voxel_size: self.output_voxel_size,
			keep_source: self.keep_source,
		}
	}
}

/// Parameters handed to the renderer of the field.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
	pub render_field: bool,
	pub render_bbox: bool,
	pub primary_trace_steps: u32,
	pub trace_epsilon: f32,
	pub shade_normal_eps: Vec3,
	pub shadow_normal_eps: f32,
	pub light_direction: Vec3,
}

impl Default for RenderSettings {
	fn default() -> Self {
		Self {
			render_field: true,
			render_bbox: true,
			primary_trace_steps: 100,
			trace_epsilon: 1e-4,
			shade_normal_eps: Vec3::splat(1.0 / 32.0),
			shadow_normal_eps: 1e-3,
			light_direction: Vec3::NEG_ONE.normalize(),
		}
	}
}

impl RenderSettings {
	/// Matches the normal estimation step to the voxel size of `data`.
	pub fn calibrate(&mut self, data: &FieldDataDesc) {
		self.shade_normal_eps = match data.kind {
			FieldKind::Sampled => data.bbox.cell_size(data.resolution),
			FieldKind::Procedural => Vec3::splat(1e-4),
		};
		self.shadow_normal_eps = self.shade_normal_eps.x;
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraPosition {
	pub name: String,
	pub position: Vec3,
	pub target: Vec3,
	pub up: Vec3,
}

/// Camera placements registered per model name.
#[derive(Debug, Clone, Default)]
pub struct CameraPositions {
	pub positions: Vec<CameraPosition>,
}

impl CameraPositions {
	pub fn register(&mut self, position: CameraPosition) {
		self.positions.retain(|existing| existing.name != position.name);
		self.positions.push(position);
	}

	pub fn by_name(&self, name: &str) -> Option<&CameraPosition> {
		self.positions.iter().find(|position| position.name == name)
	}
}
