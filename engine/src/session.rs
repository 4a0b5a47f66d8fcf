use crate::backend::{ComputeBackend, DispatchRequest, SourceBinding, TexelFormat};
use crate::config::GeneratorConfig;
use crate::desc::{
	CameraPosition, CameraPositions, FieldKind, GenerationDesc, RenderSettings, SourceKind,
};
use crate::error::GenerationError;
use crate::field::Field;
use crate::lifecycle::FieldState;
use crate::mesh::FlatMesh;
use crate::offsets::InputAddressing;
use crate::scheduler::{ChunkStep, GenerationScheduler};
use crate::state::GenerationState;
use bevy::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Snapshot of a running generation for display.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationProgress {
	pub output_voxel_size: UVec3,
	pub input_voxel_size: UVec3,
	pub output_dispatch_index: u64,
	pub output_dispatch_count: u64,
	pub input_dispatch_index: u64,
	pub input_dispatch_count: u64,
	pub dispatched: u64,
	pub total: u64,
	pub fraction: f32,
	pub elapsed: Duration,
}

/// Result of [`GenerationSession::postprocess`].
#[derive(Debug, Clone, PartialEq)]
pub enum PostprocessOutcome {
	/// The field wasn't waiting for postprocessing.
	Skipped,
	/// The field completed. Carries the camera registered for the model, if any.
	Completed { camera: Option<CameraPosition> },
}

/// Source data of a chunked generation, kept until it finishes.
#[derive(Debug)]
struct ChunkedSource {
	mesh: Arc<FlatMesh>,
}

/// One field generation workflow: settings, the field it produced, and the scheduler driving it.
pub struct GenerationSession<B: ComputeBackend> {
	pub settings: GenerationDesc,
	pub render: RenderSettings,
	field: Option<Field<B::Volume>>,
	scheduler: GenerationScheduler,
	chunked: Option<ChunkedSource>,
	started_at: Option<Instant>,
	generation_requested: bool,
	program_rebuild: bool,
}

impl<B: ComputeBackend> Default for GenerationSession<B> {
	fn default() -> Self {
		Self::new(GenerationDesc::default())
	}
}

impl<B: ComputeBackend> GenerationSession<B> {
	pub fn new(settings: GenerationDesc) -> Self {
		Self {
			settings,
			render: RenderSettings::default(),
			field: None,
			scheduler: GenerationScheduler::default(),
			chunked: None,
			started_at: None,
			generation_requested: false,
			program_rebuild: false,
		}
	}

	/// New session with the same settings and no field.
	pub fn fork(&self) -> Self {
		Self {
			settings: self.settings.clone(),
			render: self.render.clone(),
			..Self::new(GenerationDesc::default())
		}
	}

	pub fn field(&self) -> Option<&Field<B::Volume>> {
		self.field.as_ref()
	}

	pub fn take_field(&mut self) -> Option<Field<B::Volume>> {
		self.field.take()
	}

	pub fn scheduler(&self) -> &GenerationScheduler {
		&self.scheduler
	}

	/// Whether a chunked generation is still dispatching or waiting for its finalization.
	pub fn is_generating(&self) -> bool {
		self.scheduler.is_active()
			|| self.field.as_ref().is_some_and(|field| {
				matches!(field.state, FieldState::Generating | FieldState::FinishedIteration)
			})
	}

	/// Asks for a generation on the next frame.
	pub fn request_generation(&mut self) {
		self.generation_requested = true;
	}

	pub fn generation_requested(&self) -> bool {
		self.generation_requested
	}

	pub(crate) fn take_generation_request(&mut self) -> bool {
		std::mem::take(&mut self.generation_requested)
	}

	/// Returns and clears the pending request to rebuild the field's trace program.
	pub fn take_program_rebuild(&mut self) -> bool {
		std::mem::take(&mut self.program_rebuild)
	}

	pub fn progress(&self) -> Option<GenerationProgress> {
		let state = self.scheduler.state();
		let fraction = self.scheduler.progress_fraction()?;
		Some(GenerationProgress {
			output_voxel_size: state.output_voxel_size,
			input_voxel_size: state.input_voxel_size,
			output_dispatch_index: state.output_dispatch_index,
			output_dispatch_count: state.output_dispatch_count,
			input_dispatch_index: state.input_dispatch_index,
			input_dispatch_count: state.input_dispatch_count,
			dispatched: state.completed_dispatches(),
			total: state.total_dispatches(),
			fraction,
			elapsed: self.started_at.map(|start| start.elapsed()).unwrap_or_default(),
		})
	}

	/// Starts a generation from the current settings.
	///
	/// `source_field` is the field to resample when the settings ask for it. On failure the error
	/// is returned and the session is left without a field.
	pub fn start_generation(
		&mut self,
		backend: &mut B,
		config: &GeneratorConfig,
		source_field: Option<&Field<B::Volume>>,
	) -> Result<(), GenerationError> {
		if self.scheduler.is_active() {
			log::warn!("replacing a running generation");
		}
		self.reset();

		match self.generate_field(backend, config, source_field) {
			Ok(field) => {
				log::info!(
					"started generating '{}' ({:?}, {:?})",
					field.model_name,
					field.state(),
					self.settings.source.kind
				);
				self.field = Some(field);
				Ok(())
			}
			Err(e) => {
				log::error!("failed to start field generation: {}", e);
				self.reset();
				Err(e)
			}
		}
	}

	fn generate_field(
		&mut self,
		backend: &mut B,
		config: &GeneratorConfig,
		source_field: Option<&Field<B::Volume>>,
	) -> Result<Field<B::Volume>, GenerationError> {
		let settings = &self.settings;
		let data = settings.data.clone();

		if data.kind == FieldKind::Procedural {
			let function = match settings.source.kind {
				SourceKind::ProceduralFunction => settings.source.procedural.clone(),
				_ => None,
			}
			.ok_or(GenerationError::MissingProceduralFunction)?;

			let mut field = Field::new(data, function.name.clone(), settings.detached());
			field.procedural = Some(function);
			field.state.begin(false);
			self.program_rebuild = true;
			return Ok(field);
		}

		if data.resolution.cmpeq(UVec3::ZERO).any() {
			return Err(GenerationError::ZeroResolution(data.resolution));
		}

		let model_name = match settings.source.kind {
			SourceKind::ResampleField => {
				let source = source_field.ok_or(GenerationError::MissingResampleSource)?;
				if !source.has_data() {
					return Err(GenerationError::EmptySourceField);
				}
				source.model_name.clone()
			}
			SourceKind::ProceduralFunction => settings
				.source
				.procedural
				.as_ref()
				.ok_or(GenerationError::MissingProceduralFunction)?
				.name
				.clone(),
			SourceKind::MeshCalc => {
				let mesh = settings.source.mesh.as_ref().ok_or(GenerationError::EmptyMesh)?;
				if mesh.triangle_count() == 0 {
					return Err(GenerationError::EmptyMesh);
				}
				mesh.name.clone()
			}
		};
		if model_name.is_empty() {
			log::warn!("couldn't determine the model name of the generated field");
		}

		let mut field = Field::new(data.clone(), model_name, settings.detached());

		if let (SourceKind::MeshCalc, Some(mesh)) = (settings.source.kind, &settings.source.mesh) {
			let state = GenerationState::linear(
				settings.output_voxel_size,
				data.resolution,
				config.mesh_chunk_size,
				mesh.triangle_count(),
			)?;
			backend.check_dispatch_extent(settings.output_voxel_size)?;

			let precision = data.half_precision;
			let volume = backend.create_volume(data.resolution, TexelFormat::distance(precision))?;
			let mut accumulator =
				backend.create_volume(data.resolution, TexelFormat::accumulator(precision))?;
			backend.prepare_accumulator(&mut accumulator)?;

			log::debug!(
				"chunking {} triangles into {} x {} dispatches",
				mesh.triangle_count(),
				state.output_dispatch_count,
				state.input_dispatch_count
			);
			field.volume = Some(volume);
			field.accumulator = Some(accumulator);
			field.state.begin(true);
			self.chunked = Some(ChunkedSource { mesh: Arc::clone(mesh) });
			self.scheduler = GenerationScheduler::new(state, InputAddressing::Linear);
			self.started_at = Some(Instant::now());
			return Ok(field);
		}

		backend.check_dispatch_extent(data.resolution)?;
		let mut volume =
			backend.create_volume(data.resolution, TexelFormat::distance(data.half_precision))?;
		let source = match (settings.source.kind, source_field, &settings.source.procedural) {
			(SourceKind::ResampleField, Some(source), _) => SourceBinding::Resample(source),
			(SourceKind::ProceduralFunction, _, Some(procedural)) => {
				SourceBinding::Procedural(procedural)
			}
			_ => return Err(GenerationError::MissingProceduralFunction),
		};
		backend.dispatch(DispatchRequest {
			destination: &mut volume,
			extent: data.resolution,
			input_extent: UVec3::ONE,
			input_offset: UVec3::ZERO,
			output_offset: UVec3::ZERO,
			resolution: data.resolution,
			bbox: data.bbox,
			source,
		})?;

		field.volume = Some(volume);
		field.state.begin(false);
		self.program_rebuild = true;
		Ok(field)
	}

	/// Dispatches the next chunk of a running mesh generation.
	///
	/// Returns whether work was performed this frame. A failed dispatch aborts the generation and
	/// discards the field.
	pub fn advance_one_chunk(&mut self, backend: &mut B) -> Result<bool, GenerationError> {
		let Self { scheduler, field, chunked, .. } = self;
		let step = scheduler.advance_one_chunk(|chunk| {
			let (Some(field), Some(chunked)) = (field.as_mut(), chunked.as_ref()) else {
				return Err(GenerationError::FieldDiscarded);
			};
			let resolution = field.desc.resolution;
			let bbox = field.desc.bbox;
			let accumulator = field.accumulator.as_mut().ok_or(GenerationError::FieldDiscarded)?;
			backend.dispatch(DispatchRequest {
				destination: accumulator,
				extent: chunk.extent,
				input_extent: chunk.input_extent,
				input_offset: chunk.offsets.input,
				output_offset: chunk.offsets.output,
				resolution,
				bbox,
				source: SourceBinding::Mesh(&chunked.mesh),
			})
		});

		match step {
			Ok(ChunkStep::Dispatched) => Ok(true),
			Ok(ChunkStep::Completed) => {
				let elapsed = self.started_at.map(|start| start.elapsed()).unwrap_or_default();
				log::info!("dispatched the last chunk after {:.2?}", elapsed);
				self.program_rebuild = true;
				Ok(true)
			}
			Ok(ChunkStep::IterationFinished) => {
				if let Some(field) = self.field.as_mut() {
					field.state.finish_iteration();
				}
				Ok(false)
			}
			Ok(ChunkStep::Idle) => Ok(false),
			Err(e) => {
				log::error!("aborting field generation: {}", e);
				self.reset();
				Err(e)
			}
		}
	}

	/// Finishes a field that is waiting for postprocessing.
	///
	/// Calibrates the render settings, finalizes mesh fields and releases the accumulation
	/// volume. Does nothing for fields in any other state.
	pub fn postprocess(
		&mut self,
		backend: &mut B,
		config: &GeneratorConfig,
		cameras: &CameraPositions,
	) -> Result<PostprocessOutcome, GenerationError> {
		let Some(field) = self.field.as_mut() else {
			return Ok(PostprocessOutcome::Skipped);
		};
		if !field.state.awaits_postprocess() {
			return Ok(PostprocessOutcome::Skipped);
		}

		self.render.calibrate(&field.desc);
		let camera = if config.set_camera_on_generation {
			cameras.by_name(&field.model_name).cloned()
		} else {
			None
		};
		self.render.render_bbox = false;

		let needs_finalize = field.state == FieldState::FinishedIteration
			&& field.generation.source.kind == SourceKind::MeshCalc;
		if needs_finalize {
			if let (Some(accumulator), Some(volume)) = (&field.accumulator, &mut field.volume) {
				if let Err(e) = backend.finalize(accumulator, volume) {
					log::error!("failed to finalize field '{}': {}", field.model_name, e);
					self.reset();
					return Err(e);
				}
			}
		}

		field.accumulator = None;
		field.state.complete();
		self.chunked = None;
		log::info!("field '{}' is complete", field.model_name);
		Ok(PostprocessOutcome::Completed { camera })
	}

	/// Stops the running generation and discards its field.
	pub fn cancel(&mut self) {
		if self.scheduler.is_active() {
			log::info!("cancelled field generation");
		}
		self.reset();
	}

	fn reset(&mut self) {
		self.scheduler.cancel();
		self.field = None;
		self.chunked = None;
		self.started_at = None;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cpu::{CpuBackend, CpuBackendConfig, CpuVolume};
	use crate::desc::{BBox, FieldDataDesc, ProceduralCatalog};

	type Session = GenerationSession<CpuBackend>;

	fn cube_settings(resolution: u32, voxel_size: u32) -> GenerationDesc {
		GenerationDesc {
			data: FieldDataDesc {
				resolution: UVec3::splat(resolution),
				bbox: BBox::new(Vec3::splat(-2.0), Vec3::splat(4.0)),
				..Default::default()
			},
			source: crate::desc::SourceDesc {
				kind: SourceKind::MeshCalc,
				mesh: Some(Arc::new(FlatMesh::cube("cube", Vec3::ZERO, 1.0))),
				procedural: None,
			},
			output_voxel_size: UVec3::splat(voxel_size),
			keep_source: false,
		}
	}

	fn small_chunks() -> GeneratorConfig {
		GeneratorConfig { mesh_chunk_size: 5, ..Default::default() }
	}

	#[test]
	fn test_mesh_generation_runs_to_completion() -> Result<(), GenerationError> {
		let mut backend = CpuBackend::default();
		let config = small_chunks();
		let mut session = Session::new(cube_settings(8, 4));
		session.start_generation(&mut backend, &config, None)?;

		let field = session.field().ok_or(GenerationError::FieldDiscarded)?;
		assert_eq!(field.state(), FieldState::Generating);
		assert_eq!(field.model_name, "cube");
		assert!(field.generation.source.mesh.is_none());

		// 8 output blocks times 3 triangle ranges
		let mut calls = 0;
		while session.advance_one_chunk(&mut backend)? {
			calls += 1;
			let progress = session.progress();
			assert!(calls == 24 || progress.is_some());
		}
		assert_eq!(calls, 24);
		assert_eq!(session.field().map(Field::state), Some(FieldState::FinishedIteration));
		assert!(session.take_program_rebuild());

		let outcome = session.postprocess(&mut backend, &config, &CameraPositions::default())?;
		assert_eq!(outcome, PostprocessOutcome::Completed { camera: None });

		let field = session.field().ok_or(GenerationError::FieldDiscarded)?;
		assert!(field.state().is_complete());
		assert!(field.accumulator().is_none());
		let volume = field.volume().ok_or(GenerationError::FieldDiscarded)?;
		assert!((volume.value(UVec3::splat(3)) + 0.75).abs() < 1e-4);
		assert!((volume.value(UVec3::ZERO) - 0.75 * 3f32.sqrt()).abs() < 1e-4);
		assert_eq!(session.render.shade_normal_eps, Vec3::splat(0.5));
		assert!(!session.render.render_bbox);

		// a second postprocess is a no-op
		let outcome = session.postprocess(&mut backend, &config, &CameraPositions::default())?;
		assert_eq!(outcome, PostprocessOutcome::Skipped);
		Ok(())
	}

	#[test]
	fn test_postprocess_waits_for_the_last_chunk() -> Result<(), GenerationError> {
		let mut backend = CpuBackend::default();
		let config = small_chunks();
		let mut session = Session::new(cube_settings(8, 4));
		assert_eq!(
			session.postprocess(&mut backend, &config, &CameraPositions::default())?,
			PostprocessOutcome::Skipped
		);

		session.start_generation(&mut backend, &config, None)?;
		assert!(session.advance_one_chunk(&mut backend)?);
		assert_eq!(
			session.postprocess(&mut backend, &config, &CameraPositions::default())?,
			PostprocessOutcome::Skipped
		);
		assert_eq!(session.field().map(Field::state), Some(FieldState::Generating));
		Ok(())
	}

	#[test]
	fn test_cancel_discards_the_field() -> Result<(), GenerationError> {
		let mut backend = CpuBackend::default();
		let config = small_chunks();
		let mut session = Session::new(cube_settings(8, 4));
		session.start_generation(&mut backend, &config, None)?;
		assert!(session.advance_one_chunk(&mut backend)?);

		session.cancel();
		assert!(session.field().is_none());
		assert!(session.progress().is_none());
		assert_eq!(session.scheduler().state().output_dispatch_count, 0);
		assert_eq!(session.scheduler().state().input_dispatch_count, 0);
		for _ in 0..3 {
			assert!(!session.advance_one_chunk(&mut backend)?);
		}
		Ok(())
	}

	#[test]
	fn test_invalid_settings_are_rejected() -> Result<(), String> {
		let mut backend = CpuBackend::default();
		let config = GeneratorConfig::default();

		let mut settings = cube_settings(8, 4);
		settings.output_voxel_size = UVec3::new(4, 0, 4);
		let mut session = Session::new(settings);
		assert_eq!(
			session.start_generation(&mut backend, &config, None),
			Err(GenerationError::ZeroVoxelSize(UVec3::new(4, 0, 4)))
		);
		assert!(session.field().is_none());
		assert!(!session.is_generating());

		let mut settings = cube_settings(8, 4);
		settings.data.resolution = UVec3::new(8, 8, 0);
		let mut session = Session::new(settings);
		assert_eq!(
			session.start_generation(&mut backend, &config, None),
			Err(GenerationError::ZeroResolution(UVec3::new(8, 8, 0)))
		);

		let mut settings = cube_settings(8, 4);
		settings.source.mesh = Some(Arc::new(FlatMesh {
			name: "empty".to_string(),
			triangles: Vec::new(),
			min_corner: Vec3::ZERO,
			max_corner: Vec3::ZERO,
		}));
		let mut session = Session::new(settings);
		assert_eq!(
			session.start_generation(&mut backend, &config, None),
			Err(GenerationError::EmptyMesh)
		);

		let mut settings = cube_settings(8, 4);
		settings.source.kind = SourceKind::ResampleField;
		let mut session = Session::new(settings);
		assert_eq!(
			session.start_generation(&mut backend, &config, None),
			Err(GenerationError::MissingResampleSource)
		);

		let mut settings = cube_settings(8, 4);
		settings.data.kind = FieldKind::Procedural;
		let mut session = Session::new(settings);
		assert_eq!(
			session.start_generation(&mut backend, &config, None),
			Err(GenerationError::MissingProceduralFunction)
		);
		Ok(())
	}

	#[test]
	fn test_device_limits_abort_at_start() -> Result<(), String> {
		let mut backend = CpuBackend::new(CpuBackendConfig {
			max_dispatch_extent: UVec3::splat(16),
			..Default::default()
		});
		let config = GeneratorConfig::default();
		let mut session = Session::new(cube_settings(64, 32));
		assert_eq!(
			session.start_generation(&mut backend, &config, None),
			Err(GenerationError::DispatchLimitExceeded {
				extent: UVec3::splat(32),
				limit: UVec3::splat(16)
			})
		);
		assert!(session.field().is_none());
		assert!(!session.is_generating());
		Ok(())
	}

	#[test]
	fn test_procedural_sources() -> Result<(), GenerationError> {
		let mut backend = CpuBackend::default();
		let config = GeneratorConfig::default();
		let catalog = ProceduralCatalog::builtin();
		let sphere = catalog.active().cloned().ok_or(GenerationError::MissingProceduralFunction)?;

		// procedural function sampled into a volume
		let mut settings = GenerationDesc::default();
		settings.data.resolution = UVec3::splat(8);
		settings.data.bbox = sphere.bbox;
		settings.source.kind = SourceKind::ProceduralFunction;
		settings.source.procedural = Some(sphere.clone());
		let mut session = Session::new(settings.clone());
		session.start_generation(&mut backend, &config, None)?;
		assert_eq!(session.field().map(Field::state), Some(FieldState::Postprocessing));
		assert!(!session.advance_one_chunk(&mut backend)?);
		let mut cameras = CameraPositions::default();
		cameras.register(CameraPosition {
			name: "sphere".to_string(),
			position: Vec3::new(0.0, 0.0, 3.0),
			target: Vec3::ZERO,
			up: Vec3::Y,
		});
		match session.postprocess(&mut backend, &config, &cameras)? {
			PostprocessOutcome::Completed { camera } => {
				assert_eq!(camera.map(|c| c.position), Some(Vec3::new(0.0, 0.0, 3.0)));
			}
			PostprocessOutcome::Skipped => return Err(GenerationError::FieldDiscarded),
		}
		let field = session.field().ok_or(GenerationError::FieldDiscarded)?;
		let volume = field.volume().ok_or(GenerationError::FieldDiscarded)?;
		let (min, max) = volume.range().ok_or(GenerationError::EmptySourceField)?;
		assert!(min < 0.0 && max > 0.0);

		// procedural field kind keeps the function and no volume
		settings.data.kind = FieldKind::Procedural;
		let mut session = Session::new(settings);
		session.start_generation(&mut backend, &config, None)?;
		let field = session.field().ok_or(GenerationError::FieldDiscarded)?;
		assert!(field.volume().is_none());
		assert!(field.has_data());
		assert_eq!(field.state(), FieldState::Postprocessing);
		session.postprocess(&mut backend, &config, &cameras)?;
		assert_eq!(session.render.shade_normal_eps, Vec3::splat(1e-4));
		Ok(())
	}

	#[test]
	fn test_resample_takes_the_source_name() -> Result<(), GenerationError> {
		let mut backend = CpuBackend::default();
		let config = small_chunks();
		let mut first = Session::new(cube_settings(8, 8));
		first.start_generation(&mut backend, &config, None)?;
		while first.advance_one_chunk(&mut backend)? {}
		first.advance_one_chunk(&mut backend)?;
		first.postprocess(&mut backend, &config, &CameraPositions::default())?;

		let mut settings = cube_settings(4, 4);
		settings.source.kind = SourceKind::ResampleField;
		let mut second = Session::new(settings);
		second.start_generation(&mut backend, &config, first.field())?;

		let field = second.field().ok_or(GenerationError::FieldDiscarded)?;
		assert_eq!(field.model_name, "cube");
		assert_eq!(field.state(), FieldState::Postprocessing);
		let volume = field.volume().ok_or(GenerationError::FieldDiscarded)?;
		assert!(volume.value(UVec3::splat(1)) < 0.0);
		assert!(volume.value(UVec3::ZERO) > 0.0);
		Ok(())
	}

	/// CPU backend whose finalization reports a mismatched volume.
	#[derive(Default)]
	struct BrokenFinalize(CpuBackend);

	impl ComputeBackend for BrokenFinalize {
		type Volume = CpuVolume;

		fn check_dispatch_extent(&self, extent: UVec3) -> Result<(), GenerationError> {
			self.0.check_dispatch_extent(extent)
		}

		fn create_volume(
			&mut self,
			resolution: UVec3,
			format: TexelFormat,
		) -> Result<CpuVolume, GenerationError> {
			self.0.create_volume(resolution, format)
		}

		fn prepare_accumulator(&mut self, accumulator: &mut CpuVolume) -> Result<(), GenerationError> {
			self.0.prepare_accumulator(accumulator)
		}

		fn dispatch(&mut self, request: DispatchRequest<'_, CpuVolume>) -> Result<(), GenerationError> {
			self.0.dispatch(request)
		}

		fn finalize(
			&mut self,
			accumulator: &CpuVolume,
			_destination: &mut CpuVolume,
		) -> Result<(), GenerationError> {
			Err(GenerationError::VolumeMismatch {
				expected: accumulator.resolution(),
				found: UVec3::ZERO,
			})
		}
	}

	#[test]
	fn test_failed_chunk_discards_the_field() -> Result<(), GenerationError> {
		let mut backend = CpuBackend::default();
		let config = small_chunks();
		let mut session = Session::new(cube_settings(8, 4));
		session.start_generation(&mut backend, &config, None)?;
		assert!(session.advance_one_chunk(&mut backend)?);

		assert!(session.take_field().is_some());
		assert_eq!(session.advance_one_chunk(&mut backend), Err(GenerationError::FieldDiscarded));
		assert!(session.field().is_none());
		assert!(session.scheduler().state().is_idle());
		assert!(!session.is_generating());
		for _ in 0..3 {
			assert!(!session.advance_one_chunk(&mut backend)?);
		}
		Ok(())
	}

	#[test]
	fn test_failed_finalize_discards_the_field() -> Result<(), GenerationError> {
		let mut backend = BrokenFinalize::default();
		let config = small_chunks();
		let mut session = GenerationSession::<BrokenFinalize>::new(cube_settings(8, 8));
		session.start_generation(&mut backend, &config, None)?;
		while session.advance_one_chunk(&mut backend)? {}
		assert!(!session.advance_one_chunk(&mut backend)?);
		assert_eq!(session.field().map(Field::state), Some(FieldState::FinishedIteration));

		let result = session.postprocess(&mut backend, &config, &CameraPositions::default());
		assert_eq!(
			result,
			Err(GenerationError::VolumeMismatch { expected: UVec3::splat(8), found: UVec3::ZERO })
		);
		assert!(session.field().is_none());
		assert!(!session.is_generating());
		assert_eq!(
			session.postprocess(&mut backend, &config, &CameraPositions::default())?,
			PostprocessOutcome::Skipped
		);
		Ok(())
	}
}
