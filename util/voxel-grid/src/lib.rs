//! Index arithmetic for dense voxel grids.
//!
//! Linear indices enumerate a grid with x fastest, then y, then z.

use bevy::prelude::*;

/// Number of cells in a grid of the given dimensions.
///
/// Computed in 64 bits, so grids whose cell count exceeds `u32::MAX` still count correctly.
/// Saturates at `u64::MAX`.
pub fn cell_count(dims: UVec3) -> u64 {
	(dims.x as u64).saturating_mul(dims.y as u64).saturating_mul(dims.z as u64)
}

/// Maps a linear index to its 3D coordinate inside `dims`.
///
/// Every component of `dims` must be nonzero.
pub fn to_3d(index: u64, dims: UVec3) -> UVec3 {
	let dx = dims.x as u64;
	let dy = dims.y as u64;
	UVec3::new((index % dx) as u32, ((index / dx) % dy) as u32, (index / (dx * dy)) as u32)
}

/// Maps a 3D coordinate to its linear index inside `dims`.
pub fn to_1d(coord: UVec3, dims: UVec3) -> u64 {
	coord.x as u64 + coord.y as u64 * dims.x as u64 + coord.z as u64 * dims.x as u64 * dims.y as u64
}

/// Componentwise ceiling division. `divisor` must be nonzero on every axis.
pub fn ceil_div(value: UVec3, divisor: UVec3) -> UVec3 {
	UVec3::new(value.x.div_ceil(divisor.x), value.y.div_ceil(divisor.y), value.z.div_ceil(divisor.z))
}
