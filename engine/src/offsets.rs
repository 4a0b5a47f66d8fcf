use crate::state::GenerationState;
use bevy::prelude::*;
use voxel_grid::to_3d;

/// How input chunks are addressed by the generation kernel.
///
/// Chosen once when a generation starts and kept for all of its dispatches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputAddressing {
	/// Input is a flat element list. The input offset carries the first element in `x` and the
	/// total element count in `y`.
	#[default]
	Linear,
	/// Input is a volume. The input offset is the chunk origin in input voxels.
	Volumetric,
}

/// Offsets handed to a single dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOffsets {
	pub input: UVec3,
	pub output: UVec3,
}

impl InputAddressing {
	/// Offsets of the chunk the state currently points at.
	///
	/// Only meaningful while neither index is exhausted.
	pub fn offsets(&self, state: &GenerationState) -> DispatchOffsets {
		let input = match self {
			InputAddressing::Linear => UVec3::new(
				(state.input_dispatch_index * state.input_voxel_size.x as u64) as u32,
				state.input_resolution.x,
				0,
			),
			InputAddressing::Volumetric => {
				to_3d(state.input_dispatch_index, state.input_dispatch_size) * state.input_voxel_size
			}
		};
		let output = to_3d(state.output_dispatch_index, state.output_dispatch_size)
			* state.output_voxel_size;

		DispatchOffsets { input, output }
	}
}
