use crate::backend::ComputeBackend;
use crate::config::GeneratorConfig;
use crate::lifecycle::FieldState;
use crate::session::{GenerationProgress, PostprocessOutcome};
use crate::workbench::Workbench;
use bevy::prelude::*;
use std::marker::PhantomData;

/// Drives the [`Workbench<B>`] resource once per frame.
///
/// Users should insert the `Workbench<B>` resource themselves; the system doesn't run without it.
pub struct FieldGenerationPlugin<B: ComputeBackend> {
	backend: PhantomData<fn() -> B>,
}

impl<B: ComputeBackend> Default for FieldGenerationPlugin<B> {
	fn default() -> Self {
		Self { backend: PhantomData }
	}
}

impl<B: ComputeBackend> Plugin for FieldGenerationPlugin<B> {
	fn build(&self, app: &mut App) {
		app.init_resource::<GeneratorConfig>()
			.init_resource::<GenerationStatus>()
			.add_systems(Update, drive_generation::<B>.run_if(resource_exists::<Workbench<B>>));
	}
}

/// What the current session of the workbench is doing, refreshed every frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct GenerationStatus {
	pub session: usize,
	pub progress: Option<GenerationProgress>,
	pub field_state: Option<FieldState>,
	/// Frames on which a chunk was dispatched since startup.
	pub chunk_frames: u64,
	/// Set when a field completed or changed; consumers clear it after rebuilding.
	pub rebuild_program: bool,
	pub last_error: Option<String>,
}

/// System advancing the current generation session by one frame.
pub fn drive_generation<B: ComputeBackend>(
	mut workbench: ResMut<Workbench<B>>,
	config: Res<GeneratorConfig>,
	mut status: ResMut<GenerationStatus>,
) {
	match workbench.frame(&config) {
		Ok(report) => {
			if report.performed_work {
				status.chunk_frames += 1;
			}
			if report.rebuild_program {
				status.rebuild_program = true;
			}
			if let PostprocessOutcome::Completed { camera: Some(camera) } = &report.postprocess {
				log::debug!("camera for '{}' at {}", camera.name, camera.position);
			}
		}
		Err(e) => {
			log::error!("field generation failed: {}", e);
			status.last_error = Some(e.to_string());
		}
	}

	let current = workbench.current();
	status.session = workbench.current_index();
	status.progress = current.progress();
	status.field_state = current.field().map(|field| field.state());
}
