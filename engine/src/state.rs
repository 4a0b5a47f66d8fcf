use crate::error::GenerationError;
use bevy::prelude::*;
use voxel_grid::{ceil_div, cell_count};

/// Position of a chunked generation inside its two dispatch grids.
///
/// The output grid tiles the field volume with blocks of `output_voxel_size` voxels, the input grid
/// tiles the source data (triangles for meshes) with blocks of `input_voxel_size` elements. Every
/// output block is visited once per input block, input blocks innermost.
///
/// A state whose output count is zero is idle. The default value is idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationState {
	pub input_resolution: UVec3,
	pub output_resolution: UVec3,
	pub input_voxel_size: UVec3,
	pub output_voxel_size: UVec3,
	pub input_dispatch_size: UVec3,
	pub output_dispatch_size: UVec3,
	pub input_dispatch_count: u64,
	pub output_dispatch_count: u64,
	pub input_dispatch_index: u64,
	pub output_dispatch_index: u64,
}

impl GenerationState {
	/// Builds the state for a volumetric input.
	///
	/// Fails when a voxel size is zero on some axis. An empty input or output resolution yields an
	/// idle state, there is nothing to generate.
	pub fn new(
		output_voxel_size: UVec3,
		output_resolution: UVec3,
		input_voxel_size: UVec3,
		input_resolution: UVec3,
	) -> Result<Self, GenerationError> {
		for voxel_size in [output_voxel_size, input_voxel_size] {
			if voxel_size.cmpeq(UVec3::ZERO).any() {
				return Err(GenerationError::ZeroVoxelSize(voxel_size));
			}
		}

		let input_dispatch_size = ceil_div(input_resolution, input_voxel_size);
		let output_dispatch_size = ceil_div(output_resolution, output_voxel_size);
		let input_dispatch_count = cell_count(input_dispatch_size);
		let output_dispatch_count = cell_count(output_dispatch_size);

		if input_dispatch_count == 0 || output_dispatch_count == 0 {
			log::debug!(
				"nothing to generate for output {} and input {}, staying idle",
				output_resolution,
				input_resolution
			);
			return Ok(Self::default());
		}

		Ok(Self {
			input_resolution,
			output_resolution,
			input_voxel_size,
			output_voxel_size,
			input_dispatch_size,
			output_dispatch_size,
			input_dispatch_count,
			output_dispatch_count,
			input_dispatch_index: 0,
			output_dispatch_index: 0,
		})
	}

	/// Builds the state for an input laid out along one axis, e.g. a triangle list.
	pub fn linear(
		output_voxel_size: UVec3,
		output_resolution: UVec3,
		input_voxel_size: u32,
		input_resolution: u32,
	) -> Result<Self, GenerationError> {
		Self::new(
			output_voxel_size,
			output_resolution,
			UVec3::new(input_voxel_size, 1, 1),
			UVec3::new(input_resolution, 1, 1),
		)
	}

	/// Builds the state for an input laid out on a plane, e.g. an image.
	pub fn planar(
		output_voxel_size: UVec3,
		output_resolution: UVec3,
		input_voxel_size: UVec2,
		input_resolution: UVec2,
	) -> Result<Self, GenerationError> {
		Self::new(
			output_voxel_size,
			output_resolution,
			input_voxel_size.extend(1),
			input_resolution.extend(1),
		)
	}

	pub fn is_idle(&self) -> bool {
		self.output_dispatch_count == 0
	}

	pub fn is_input_exhausted(&self) -> bool {
		self.input_dispatch_index >= self.input_dispatch_count
	}

	pub fn is_output_exhausted(&self) -> bool {
		self.output_dispatch_index >= self.output_dispatch_count
	}

	/// Total number of dispatches the generation performs. Saturates at `u64::MAX`.
	pub fn total_dispatches(&self) -> u64 {
		self.output_dispatch_count.saturating_mul(self.input_dispatch_count)
	}

	/// Number of dispatches already performed. Saturates at `u64::MAX`.
	pub fn completed_dispatches(&self) -> u64 {
		self.output_dispatch_index
			.saturating_mul(self.input_dispatch_count)
			.saturating_add(self.input_dispatch_index)
	}

	/// Completed share of the generation, `None` when idle.
	pub fn progress_fraction(&self) -> Option<f32> {
		if self.is_idle() || self.input_dispatch_count == 0 {
			return None;
		}
		let input_count = self.input_dispatch_count as f64;
		let completed =
			self.output_dispatch_index as f64 * input_count + self.input_dispatch_index as f64;
		let total = self.output_dispatch_count as f64 * input_count;
		Some((completed / total) as f32)
	}
}
