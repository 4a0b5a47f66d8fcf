use crate::backend::TexelFormat;
use bevy::prelude::*;

/// Errors raised while starting or running a field generation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
	#[error("voxel size must be nonzero along every axis, got {0}")]
	ZeroVoxelSize(UVec3),
	#[error("field resolution must be nonzero along every axis, got {0}")]
	ZeroResolution(UVec3),
	#[error("a procedural field was requested without a procedural function")]
	MissingProceduralFunction,
	#[error("resampling was requested but there is no source field")]
	MissingResampleSource,
	#[error("the source field has no data to resample")]
	EmptySourceField,
	#[error("the source mesh has no triangles")]
	EmptyMesh,
	#[error("mesh index {index} is out of range for {vertex_count} vertices")]
	InvalidMeshIndex { index: u32, vertex_count: usize },
	#[error("dispatch extent {extent} exceeds the device limit {limit}")]
	DispatchLimitExceeded { extent: UVec3, limit: UVec3 },
	#[error("failed to allocate a {resolution} volume with {channels} channels")]
	VolumeAllocation { resolution: UVec3, channels: usize },
	#[error("expected a {expected:?} volume, got {found:?}")]
	TexelFormatMismatch { expected: TexelFormat, found: TexelFormat },
	#[error("volume resolution {found} does not match the expected {expected}")]
	VolumeMismatch { expected: UVec3, found: UVec3 },
	#[error("the field of the running generation was discarded")]
	FieldDiscarded,
}
