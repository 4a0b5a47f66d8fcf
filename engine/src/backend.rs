use crate::desc::{BBox, ProceduralSdf};
use crate::error::GenerationError;
use crate::field::Field;
use crate::mesh::FlatMesh;
use bevy::prelude::*;

/// Texel layout of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelFormat {
	R16Float,
	R32Float,
	Rgba16Float,
	Rgba32Float,
}

impl TexelFormat {
	/// Format of the distance volume of a field.
	pub fn distance(half_precision: bool) -> Self {
		if half_precision {
			TexelFormat::R16Float
		} else {
			TexelFormat::R32Float
		}
	}

	/// Format of the accumulation volume of a mesh generation.
	pub fn accumulator(half_precision: bool) -> Self {
		if half_precision {
			TexelFormat::Rgba16Float
		} else {
			TexelFormat::Rgba32Float
		}
	}

	pub fn channels(self) -> usize {
		match self {
			TexelFormat::R16Float | TexelFormat::R32Float => 1,
			TexelFormat::Rgba16Float | TexelFormat::Rgba32Float => 4,
		}
	}
}

/// Data a dispatch reads from.
pub enum SourceBinding<'a, V> {
	/// Triangles of a mesh. The dispatch covers the range described by its input offset.
	Mesh(&'a FlatMesh),
	Procedural(&'a ProceduralSdf),
	/// A previously generated field.
	Resample(&'a Field<V>),
}

/// One bounded unit of work.
pub struct DispatchRequest<'a, V> {
	/// Volume written by the dispatch. For mesh chunks this is the accumulation volume.
	pub destination: &'a mut V,
	/// Output voxels to cover, starting at `output_offset`. Clipped to `resolution`.
	pub extent: UVec3,
	/// Input elements covered by one dispatch.
	pub input_extent: UVec3,
	pub input_offset: UVec3,
	pub output_offset: UVec3,
	/// Resolution of the destination volume.
	pub resolution: UVec3,
	/// World space box the destination volume spans.
	pub bbox: BBox,
	pub source: SourceBinding<'a, V>,
}

/// Device that owns volumes and executes generation kernels.
pub trait ComputeBackend: Send + Sync + 'static {
	type Volume: Send + Sync + 'static;

	/// Fails when a single dispatch of `extent` voxels is more than the device can run.
	fn check_dispatch_extent(&self, extent: UVec3) -> Result<(), GenerationError>;

	fn create_volume(
		&mut self,
		resolution: UVec3,
		format: TexelFormat,
	) -> Result<Self::Volume, GenerationError>;

	/// Resets an accumulation volume before the first mesh chunk is dispatched.
	fn prepare_accumulator(&mut self, accumulator: &mut Self::Volume)
		-> Result<(), GenerationError>;

	fn dispatch(&mut self, request: DispatchRequest<'_, Self::Volume>)
		-> Result<(), GenerationError>;

	/// Turns a fully accumulated mesh generation into signed distances.
	fn finalize(
		&mut self,
		accumulator: &Self::Volume,
		destination: &mut Self::Volume,
	) -> Result<(), GenerationError>;
}
