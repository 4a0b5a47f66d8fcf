use crate::backend::{ComputeBackend, DispatchRequest, SourceBinding, TexelFormat};
use crate::desc::BBox;
use crate::error::GenerationError;
use crate::mesh::Triangle;
use bevy::prelude::*;
use rayon::prelude::*;
use voxel_grid::{cell_count, to_1d, to_3d};

/// Limits of the CPU backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuBackendConfig {
	/// Largest dispatch extent accepted along each axis.
	pub max_dispatch_extent: UVec3,
	/// Largest volume, in texels, the backend will allocate.
	pub max_volume_texels: u64,
}

impl Default for CpuBackendConfig {
	fn default() -> Self {
		Self { max_dispatch_extent: UVec3::splat(1024), max_volume_texels: 1 << 30 }
	}
}

/// Dense volume held in host memory.
///
/// Texels are stored as `f32` whatever the requested precision.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuVolume {
	resolution: UVec3,
	format: TexelFormat,
	data: Vec<f32>,
}

impl CpuVolume {
	pub fn resolution(&self) -> UVec3 {
		self.resolution
	}

	pub fn format(&self) -> TexelFormat {
		self.format
	}

	fn offset(&self, coord: UVec3) -> usize {
		to_1d(coord, self.resolution) as usize * self.format.channels()
	}

	pub fn texel(&self, coord: UVec3) -> &[f32] {
		let offset = self.offset(coord);
		&self.data[offset..offset + self.format.channels()]
	}

	/// First channel of the texel at `coord`.
	pub fn value(&self, coord: UVec3) -> f32 {
		self.data[self.offset(coord)]
	}

	/// Smallest and largest finite value of the first channel.
	pub fn range(&self) -> Option<(f32, f32)> {
		self.data
			.chunks_exact(self.format.channels())
			.map(|texel| texel[0])
			.filter(|value| value.is_finite())
			.fold(None, |range, value| match range {
				None => Some((value, value)),
				Some((min, max)) => Some((value.min(min), value.max(max))),
			})
	}

	/// Trilinear sample of the first channel at world position `p`, for a volume spanning `bbox`.
	///
	/// Positions outside the voxel centres are clamped to the border.
	pub fn sample(&self, bbox: &BBox, p: Vec3) -> f32 {
		let resolution = self.resolution.as_vec3();
		let last = self.resolution - 1;
		let t = ((p - bbox.corner) / bbox.size * resolution - 0.5)
			.clamp(Vec3::ZERO, resolution - 1.0);
		let base = t.floor().as_uvec3().min(last);
		let next = (base + 1).min(last);
		let f = t - base.as_vec3();

		let v = |x: u32, y: u32, z: u32| self.value(UVec3::new(x, y, z));
		let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

		let y0 = lerp(
			lerp(v(base.x, base.y, base.z), v(next.x, base.y, base.z), f.x),
			lerp(v(base.x, next.y, base.z), v(next.x, next.y, base.z), f.x),
			f.y,
		);
		let y1 = lerp(
			lerp(v(base.x, base.y, next.z), v(next.x, base.y, next.z), f.x),
			lerp(v(base.x, next.y, next.z), v(next.x, next.y, next.z), f.x),
			f.y,
		);
		lerp(y0, y1, f.z)
	}
}

/// Reference backend evaluating every kernel on the CPU with rayon.
///
/// Mesh chunks accumulate, per voxel, the minimum distance to the chunk's triangles in the first
/// channel and their generalized winding number in the second. Finalization signs the distance
/// by the winding number.
#[derive(Debug, Clone, Default)]
pub struct CpuBackend {
	pub config: CpuBackendConfig,
}

impl CpuBackend {
	pub fn new(config: CpuBackendConfig) -> Self {
		Self { config }
	}
}

/// Part of the volume a dispatch covers, as (first voxel, size).
fn covered_block(offset: UVec3, extent: UVec3, resolution: UVec3) -> (UVec3, UVec3) {
	let end = offset.saturating_add(extent).min(resolution);
	(offset, end.saturating_sub(offset))
}

fn fill<F>(volume: &mut CpuVolume, bbox: &BBox, start: UVec3, size: UVec3, distance: F)
where
	F: Fn(Vec3) -> f32 + Sync,
{
	let resolution = volume.resolution;
	let channels = volume.format.channels();
	let values: Vec<(usize, f32)> = (0..cell_count(size))
		.into_par_iter()
		.map(|i| {
			let coord = start + to_3d(i, size);
			let p = bbox.voxel_center(coord, resolution);
			(to_1d(coord, resolution) as usize * channels, distance(p))
		})
		.collect();

	for (offset, value) in values {
		volume.data[offset] = value;
	}
}

fn accumulate(volume: &mut CpuVolume, bbox: &BBox, start: UVec3, size: UVec3, triangles: &[Triangle]) {
	let resolution = volume.resolution;
	let channels = volume.format.channels();
	let data = &volume.data;
	let texels: Vec<(usize, f32, f32)> = (0..cell_count(size))
		.into_par_iter()
		.map(|i| {
			let coord = start + to_3d(i, size);
			let p = bbox.voxel_center(coord, resolution);
			let offset = to_1d(coord, resolution) as usize * channels;

			let (mut distance, mut winding) = (data[offset], data[offset + 1]);
			for triangle in triangles {
				distance = distance.min(triangle.distance(p));
				winding += triangle.winding(p);
			}
			(offset, distance, winding)
		})
		.collect();

	for (offset, distance, winding) in texels {
		volume.data[offset] = distance;
		volume.data[offset + 1] = winding;
	}
}

fn expect_accumulator(volume: &CpuVolume) -> Result<(), GenerationError> {
	if volume.format.channels() < 2 {
		return Err(GenerationError::TexelFormatMismatch {
			expected: TexelFormat::Rgba32Float,
			found: volume.format,
		});
	}
	Ok(())
}

impl ComputeBackend for CpuBackend {
	type Volume = CpuVolume;

	fn check_dispatch_extent(&self, extent: UVec3) -> Result<(), GenerationError> {
		if extent.cmpeq(UVec3::ZERO).any() {
			return Err(GenerationError::ZeroVoxelSize(extent));
		}
		let limit = self.config.max_dispatch_extent;
		if extent.cmpgt(limit).any() {
			return Err(GenerationError::DispatchLimitExceeded { extent, limit });
		}
		Ok(())
	}

	fn create_volume(
		&mut self,
		resolution: UVec3,
		format: TexelFormat,
	) -> Result<CpuVolume, GenerationError> {
		if resolution.cmpeq(UVec3::ZERO).any() {
			return Err(GenerationError::ZeroResolution(resolution));
		}

		let channels = format.channels();
		let allocation_error = GenerationError::VolumeAllocation { resolution, channels };
		let texels = cell_count(resolution);
		if texels > self.config.max_volume_texels {
			return Err(allocation_error);
		}
		let len = usize::try_from(texels)
			.ok()
			.and_then(|texels| texels.checked_mul(channels))
			.ok_or(allocation_error.clone())?;

		let mut data = Vec::new();
		data.try_reserve_exact(len).map_err(|_| allocation_error)?;
		data.resize(len, 0.0);

		log::debug!("allocated {:?} volume of {}", format, resolution);
		Ok(CpuVolume { resolution, format, data })
	}

	fn prepare_accumulator(&mut self, accumulator: &mut CpuVolume) -> Result<(), GenerationError> {
		expect_accumulator(accumulator)?;
		let channels = accumulator.format.channels();
		accumulator.data.par_chunks_mut(channels).for_each(|texel| {
			texel.fill(0.0);
			texel[0] = f32::INFINITY;
		});
		Ok(())
	}

	fn dispatch(&mut self, request: DispatchRequest<'_, CpuVolume>) -> Result<(), GenerationError> {
		self.check_dispatch_extent(request.extent)?;

		let DispatchRequest {
			destination,
			extent,
			input_extent,
			input_offset,
			output_offset,
			resolution,
			bbox,
			source,
		} = request;

		if destination.resolution != resolution {
			return Err(GenerationError::VolumeMismatch {
				expected: resolution,
				found: destination.resolution,
			});
		}
		let (start, size) = covered_block(output_offset, extent, resolution);

		match source {
			SourceBinding::Mesh(mesh) => {
				expect_accumulator(destination)?;
				let total = (input_offset.y as usize).min(mesh.triangles.len());
				let first = (input_offset.x as usize).min(total);
				let last = first.saturating_add(input_extent.x as usize).min(total);
				accumulate(destination, &bbox, start, size, &mesh.triangles[first..last]);
			}
			SourceBinding::Procedural(procedural) => {
				fill(destination, &bbox, start, size, |p| procedural.distance(p));
			}
			SourceBinding::Resample(field) => match (field.volume(), field.procedural()) {
				(Some(volume), _) => {
					let source_box = field.desc.bbox;
					fill(destination, &bbox, start, size, |p| volume.sample(&source_box, p));
				}
				(None, Some(procedural)) => {
					fill(destination, &bbox, start, size, |p| procedural.distance(p));
				}
				(None, None) => return Err(GenerationError::EmptySourceField),
			},
		}

		Ok(())
	}

	fn finalize(
		&mut self,
		accumulator: &CpuVolume,
		destination: &mut CpuVolume,
	) -> Result<(), GenerationError> {
		expect_accumulator(accumulator)?;
		if accumulator.resolution != destination.resolution {
			return Err(GenerationError::VolumeMismatch {
				expected: destination.resolution,
				found: accumulator.resolution,
			});
		}

		let out_channels = destination.format.channels();
		let in_channels = accumulator.format.channels();
		destination
			.data
			.par_chunks_mut(out_channels)
			.zip(accumulator.data.par_chunks(in_channels))
			.for_each(|(out, texel)| {
				let (distance, winding) = (texel[0], texel[1]);
				out[0] = if winding.abs() > 0.5 { -distance } else { distance };
			});
		Ok(())
	}
}
