use crate::backend::ComputeBackend;
use crate::config::GeneratorConfig;
use crate::desc::{CameraPositions, ProceduralCatalog};
use crate::error::GenerationError;
use crate::session::{GenerationSession, PostprocessOutcome};
use bevy::prelude::*;

/// What happened during one [`Workbench::frame`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
	/// A generation request was serviced.
	pub started: bool,
	/// A chunk was dispatched.
	pub performed_work: bool,
	pub postprocess: PostprocessOutcome,
	/// The current field changed and its trace program should be rebuilt.
	pub rebuild_program: bool,
}

/// Collection of generation sessions sharing one compute backend.
///
/// Only the selected session is driven each frame.
#[derive(Resource)]
pub struct Workbench<B: ComputeBackend> {
	pub backend: B,
	pub catalog: ProceduralCatalog,
	pub cameras: CameraPositions,
	sessions: Vec<GenerationSession<B>>,
	current: usize,
}

impl<B: ComputeBackend> Workbench<B> {
	/// Workbench holding a single session with default settings.
	pub fn new(backend: B) -> Self {
		Self {
			backend,
			catalog: ProceduralCatalog::builtin(),
			cameras: CameraPositions::default(),
			sessions: vec![GenerationSession::default()],
			current: 0,
		}
	}

	pub fn sessions(&self) -> &[GenerationSession<B>] {
		&self.sessions
	}

	pub fn current_index(&self) -> usize {
		self.current
	}

	pub fn current(&self) -> &GenerationSession<B> {
		&self.sessions[self.current]
	}

	pub fn current_mut(&mut self) -> &mut GenerationSession<B> {
		&mut self.sessions[self.current]
	}

	/// Makes session `index` current, returning whether it exists.
	pub fn select(&mut self, index: usize) -> bool {
		if index >= self.sessions.len() {
			return false;
		}
		self.current = index;
		true
	}

	/// Copies the current session's settings into a new session and selects it.
	pub fn fork_current(&mut self) -> usize {
		let fork = self.current().fork();
		self.sessions.push(fork);
		self.current = self.sessions.len() - 1;
		self.current
	}

	pub fn request_generation(&mut self) {
		self.current_mut().request_generation();
	}

	pub fn cancel_current(&mut self) {
		self.current_mut().cancel();
	}

	/// Services a pending generation request on the current session.
	///
	/// A request made while the session is generating stays pending until that generation is
	/// finished. With `keep_source` the current session is forked first, so its field survives
	/// and becomes the resample source of the new session. Otherwise the current field is taken
	/// out and used as the source.
	fn start_requested(&mut self, config: &GeneratorConfig) -> Result<bool, GenerationError> {
		if self.current().is_generating() || !self.current_mut().take_generation_request() {
			return Ok(false);
		}

		let active = self.catalog.active().cloned();
		if self.current().settings.keep_source {
			let source = self.current;
			let target = self.fork_current();
			let (head, tail) = self.sessions.split_at_mut(target);
			let session = &mut tail[0];
			session.settings.source.procedural = active;
			session.start_generation(&mut self.backend, config, head[source].field())?;
		} else {
			let session = &mut self.sessions[self.current];
			let source = session.take_field();
			session.settings.source.procedural = active;
			session.start_generation(&mut self.backend, config, source.as_ref())?;
		}
		Ok(true)
	}

	/// Runs one frame of the current session.
	///
	/// Services a generation request, then dispatches at most one chunk. Postprocessing only runs
	/// on frames that dispatched nothing.
	pub fn frame(&mut self, config: &GeneratorConfig) -> Result<FrameReport, GenerationError> {
		let started = self.start_requested(config)?;

		let session = &mut self.sessions[self.current];
		if session.advance_one_chunk(&mut self.backend)? {
			return Ok(FrameReport {
				started,
				performed_work: true,
				postprocess: PostprocessOutcome::Skipped,
				rebuild_program: false,
			});
		}

		let postprocess = session.postprocess(&mut self.backend, config, &self.cameras)?;
		let rebuild_program = session.take_program_rebuild() && session.field().is_some();
		Ok(FrameReport { started, performed_work: false, postprocess, rebuild_program })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cpu::CpuBackend;
	use crate::desc::{BBox, FieldDataDesc, GenerationDesc, SourceDesc, SourceKind};
	use crate::lifecycle::FieldState;
	use crate::mesh::FlatMesh;
	use std::sync::Arc;

	fn cube_workbench() -> Workbench<CpuBackend> {
		let mut workbench = Workbench::new(CpuBackend::default());
		workbench.current_mut().settings = GenerationDesc {
			data: FieldDataDesc {
				resolution: UVec3::splat(8),
				bbox: BBox::new(Vec3::splat(-2.0), Vec3::splat(4.0)),
				..Default::default()
			},
			source: SourceDesc {
				kind: SourceKind::MeshCalc,
				mesh: Some(Arc::new(FlatMesh::cube("cube", Vec3::ZERO, 1.0))),
				procedural: None,
			},
			output_voxel_size: UVec3::splat(4),
			keep_source: false,
		};
		workbench
	}

	fn run_to_completion(
		workbench: &mut Workbench<CpuBackend>,
		config: &GeneratorConfig,
	) -> Result<usize, GenerationError> {
		for frame in 1..1000 {
			let report = workbench.frame(config)?;
			if matches!(report.postprocess, PostprocessOutcome::Completed { .. }) {
				assert!(report.rebuild_program);
				return Ok(frame);
			}
		}
		Err(GenerationError::FieldDiscarded)
	}

	#[test]
	fn test_frames_advance_then_postprocess() -> Result<(), GenerationError> {
		let config = GeneratorConfig { mesh_chunk_size: 5, ..Default::default() };
		let mut workbench = cube_workbench();

		let idle = workbench.frame(&config)?;
		assert!(!idle.started && !idle.performed_work);

		workbench.request_generation();
		let first = workbench.frame(&config)?;
		assert!(first.started && first.performed_work);

		// 24 chunks, one frame to notice the iteration finished and postprocess
		let frames = run_to_completion(&mut workbench, &config)?;
		assert_eq!(frames, 24);
		assert_eq!(
			workbench.current().field().map(|field| field.state()),
			Some(FieldState::Complete)
		);
		assert_eq!(workbench.sessions().len(), 1);
		Ok(())
	}

	#[test]
	fn test_request_waits_for_the_running_generation() -> Result<(), GenerationError> {
		let config = GeneratorConfig { mesh_chunk_size: 12, ..Default::default() };
		let mut workbench = cube_workbench();
		workbench.request_generation();
		assert!(workbench.frame(&config)?.started);

		workbench.request_generation();
		let report = workbench.frame(&config)?;
		assert!(!report.started && report.performed_work);
		assert!(workbench.current().generation_requested());

		// remaining 6 chunks, then the finalization frame
		for _ in 0..7 {
			assert!(!workbench.frame(&config)?.started);
		}
		assert_eq!(
			workbench.current().field().map(|field| field.state()),
			Some(FieldState::Complete)
		);
		assert!(workbench.frame(&config)?.started);
		assert!(!workbench.current().generation_requested());
		Ok(())
	}

	#[test]
	fn test_keep_source_forks_and_resamples() -> Result<(), GenerationError> {
		let config = GeneratorConfig { mesh_chunk_size: 12, ..Default::default() };
		let mut workbench = cube_workbench();
		workbench.request_generation();
		run_to_completion(&mut workbench, &config)?;

		let session = workbench.current_mut();
		session.settings.keep_source = true;
		session.settings.source.kind = SourceKind::ResampleField;
		session.settings.data.resolution = UVec3::splat(4);
		workbench.request_generation();
		run_to_completion(&mut workbench, &config)?;

		assert_eq!(workbench.sessions().len(), 2);
		assert_eq!(workbench.current_index(), 1);
		let original = workbench.sessions()[0].field().ok_or(GenerationError::FieldDiscarded)?;
		let resampled = workbench.current().field().ok_or(GenerationError::FieldDiscarded)?;
		assert_eq!(original.desc.resolution, UVec3::splat(8));
		assert_eq!(resampled.desc.resolution, UVec3::splat(4));
		assert_eq!(resampled.model_name, "cube");
		assert!(resampled.state().is_complete());
		Ok(())
	}

	#[test]
	fn test_resample_in_place_consumes_the_field() -> Result<(), GenerationError> {
		let config = GeneratorConfig { mesh_chunk_size: 12, ..Default::default() };
		let mut workbench = cube_workbench();
		workbench.request_generation();
		run_to_completion(&mut workbench, &config)?;

		let session = workbench.current_mut();
		session.settings.source.kind = SourceKind::ResampleField;
		session.settings.data.resolution = UVec3::splat(16);
		workbench.request_generation();
		let report = workbench.frame(&config)?;
		assert!(report.started);
		assert!(matches!(report.postprocess, PostprocessOutcome::Completed { .. }));
		assert_eq!(workbench.sessions().len(), 1);
		let field = workbench.current().field().ok_or(GenerationError::FieldDiscarded)?;
		assert_eq!(field.desc.resolution, UVec3::splat(16));

		// nothing left to resample from once the field is gone
		workbench.cancel_current();
		workbench.request_generation();
		assert_eq!(workbench.frame(&config), Err(GenerationError::MissingResampleSource));
		assert!(workbench.current().field().is_none());
		Ok(())
	}

	#[test]
	fn test_procedural_request_uses_the_active_catalog_entry() -> Result<(), GenerationError> {
		let config = GeneratorConfig::default();
		let mut workbench = Workbench::new(CpuBackend::default());
		assert!(workbench.catalog.select("torus"));
		let session = workbench.current_mut();
		session.settings.source.kind = SourceKind::ProceduralFunction;
		session.settings.data.resolution = UVec3::splat(8);

		workbench.request_generation();
		workbench.frame(&config)?;
		let field = workbench.current().field().ok_or(GenerationError::FieldDiscarded)?;
		assert_eq!(field.model_name, "torus");
		assert!(field.state().is_complete());
		Ok(())
	}

	#[test]
	fn test_select_bounds() -> Result<(), String> {
		let mut workbench = Workbench::new(CpuBackend::default());
		assert!(workbench.select(0));
		assert!(!workbench.select(1));
		assert_eq!(workbench.fork_current(), 1);
		assert!(workbench.select(0));
		assert_eq!(workbench.current_index(), 0);
		Ok(())
	}
}
