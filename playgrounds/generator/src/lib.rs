use bevy::prelude::*;
use std::sync::Arc;

use field_engine::sdf::{SphereSdf, Translate, Union};
use field_engine::{
	drive_generation, BBox, CameraPosition, CpuBackend, FieldGenerationPlugin, FieldKind,
	FieldState, FlatMesh, GenerationStatus, GeneratorConfig, ProceduralSdf, SourceKind, Workbench,
};

pub use field_engine;

/// Input of the demo generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DemoSource {
	#[default]
	Cube,
	Octahedron,
	/// An entry of the builtin procedural catalog.
	Procedural,
}

/// What the playground generates.
#[derive(Resource, Debug, Clone)]
pub struct DemoSettings {
	pub source: DemoSource,
	/// Catalog entry used by [`DemoSource::Procedural`].
	pub shape: String,
	pub resolution: u32,
	pub voxel_size: u32,
	pub half_precision: bool,
	/// Resample the finished field into a second session at this resolution.
	pub resample: Option<u32>,
}

impl Default for DemoSettings {
	fn default() -> Self {
		Self {
			source: DemoSource::Cube,
			shape: "sphere".to_string(),
			resolution: 64,
			voxel_size: 32,
			half_precision: false,
			resample: None,
		}
	}
}

impl DemoSettings {
	/// Workbench with the demo source configured and a generation requested.
	pub fn workbench(&self) -> Workbench<CpuBackend> {
		let mut workbench = Workbench::new(CpuBackend::default());
		workbench.catalog.push(snowman());
		if !workbench.catalog.select(&self.shape) {
			log::warn!("unknown shape '{}', using '{}'", self.shape, self.fallback_shape(&workbench));
		}

		let mesh = match self.source {
			DemoSource::Cube => Some(FlatMesh::cube("cube", Vec3::ZERO, 0.5)),
			DemoSource::Octahedron => Some(FlatMesh::octahedron("octahedron", Vec3::ZERO, 0.6)),
			DemoSource::Procedural => None,
		};
		let bbox = match (&mesh, workbench.catalog.active()) {
			(Some(mesh), _) => mesh.bounds().padded(0.1),
			(None, Some(procedural)) => procedural.bbox,
			(None, None) => BBox::default(),
		};
		if let Some(mesh) = &mesh {
			workbench.cameras.register(CameraPosition {
				name: mesh.name.clone(),
				position: bbox.center() + Vec3::new(0.0, 0.5, 2.0) * bbox.size.max_element(),
				target: bbox.center(),
				up: Vec3::Y,
			});
		}

		let session = workbench.current_mut();
		session.settings.data.kind = FieldKind::Sampled;
		session.settings.data.resolution = UVec3::splat(self.resolution);
		session.settings.data.half_precision = self.half_precision;
		session.settings.data.bbox = bbox;
		session.settings.output_voxel_size = UVec3::splat(self.voxel_size);
		session.settings.source.kind = match mesh {
			Some(_) => SourceKind::MeshCalc,
			None => SourceKind::ProceduralFunction,
		};
		session.settings.source.mesh = mesh.map(Arc::new);
		workbench.request_generation();
		workbench
	}

	fn fallback_shape<'a>(&self, workbench: &'a Workbench<CpuBackend>) -> &'a str {
		workbench.catalog.active().map(|procedural| procedural.name.as_str()).unwrap_or("none")
	}
}

/// Two stacked spheres, added to the builtin shapes.
fn snowman() -> ProceduralSdf {
	let body = SphereSdf::new(Vec3::ZERO, 0.35);
	let head = Translate::new(SphereSdf::new(Vec3::ZERO, 0.22), Vec3::new(0.0, 0.5, 0.0));
	ProceduralSdf::bounded("snowman", Union::new(body, head), 0.1)
}

/// Where the demo run stands.
#[derive(Resource, Debug, Clone, Default)]
pub struct DemoRun {
	pub resample_requested: bool,
	pub finished: bool,
}

pub struct GeneratorPlaygroundPlugin {
	pub settings: DemoSettings,
	pub config: GeneratorConfig,
}

impl Plugin for GeneratorPlaygroundPlugin {
	fn build(&self, app: &mut App) {
		app.add_plugins(FieldGenerationPlugin::<CpuBackend>::default())
			.insert_resource(self.config.clone())
			.insert_resource(self.settings.workbench())
			.insert_resource(self.settings.clone())
			.init_resource::<DemoRun>()
			.add_systems(
				Update,
				(log_progress, follow_up).chain().after(drive_generation::<CpuBackend>),
			);
	}
}

/// Logs every finished output block.
fn log_progress(status: Res<GenerationStatus>, mut last_block: Local<Option<u64>>) {
	let Some(progress) = &status.progress else {
		*last_block = None;
		return;
	};
	if *last_block == Some(progress.output_dispatch_index) {
		return;
	}
	*last_block = Some(progress.output_dispatch_index);
	log::info!(
		"session {}: block {}/{}, {}/{} dispatches ({:.0}%) after {:.2?}",
		status.session,
		progress.output_dispatch_index,
		progress.output_dispatch_count,
		progress.dispatched,
		progress.total,
		progress.fraction * 100.0,
		progress.elapsed
	);
}

/// Starts the optional resample once the first field completes and marks the run finished.
fn follow_up(
	status: Res<GenerationStatus>,
	settings: Res<DemoSettings>,
	mut run: ResMut<DemoRun>,
	mut workbench: ResMut<Workbench<CpuBackend>>,
) {
	if run.finished || status.field_state != Some(FieldState::Complete) {
		return;
	}

	match settings.resample {
		Some(resolution) if !run.resample_requested => {
			let session = workbench.current_mut();
			session.settings.keep_source = true;
			session.settings.source.kind = SourceKind::ResampleField;
			session.settings.data.resolution = UVec3::splat(resolution);
			workbench.request_generation();
			run.resample_requested = true;
			log::info!("resampling into a {}^3 field", resolution);
		}
		_ => run.finished = true,
	}
}

/// Description of the field the run ended with.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
	pub model_name: String,
	pub sessions: usize,
	pub resolution: UVec3,
	pub state: FieldState,
	pub range: Option<(f32, f32)>,
}

pub fn summarize(world: &World) -> anyhow::Result<FieldSummary> {
	let workbench = world
		.get_resource::<Workbench<CpuBackend>>()
		.ok_or_else(|| anyhow::anyhow!("the workbench resource is missing"))?;
	let field = workbench
		.current()
		.field()
		.ok_or_else(|| anyhow::anyhow!("session {} has no field", workbench.current_index()))?;

	Ok(FieldSummary {
		model_name: field.model_name.clone(),
		sessions: workbench.sessions().len(),
		resolution: field.desc.resolution,
		state: field.state(),
		range: field.volume().and_then(|volume| volume.range()),
	})
}
