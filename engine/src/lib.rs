pub mod backend;
pub mod config;
pub mod cpu;
pub mod desc;
pub mod error;
pub mod field;
pub mod lifecycle;
pub mod mesh;
pub mod offsets;
pub mod plugin;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod workbench;

pub use backend::{ComputeBackend, DispatchRequest, SourceBinding, TexelFormat};
pub use config::GeneratorConfig;
pub use cpu::{CpuBackend, CpuBackendConfig, CpuVolume};
pub use desc::{
	BBox, CameraPosition, CameraPositions, FieldDataDesc, FieldKind, GenerationDesc,
	ProceduralCatalog, ProceduralSdf, RenderSettings, SourceDesc, SourceKind,
};
pub use error::GenerationError;
pub use field::Field;
pub use lifecycle::FieldState;
pub use mesh::{FlatMesh, Triangle};
pub use offsets::{DispatchOffsets, InputAddressing};
pub use plugin::{drive_generation, FieldGenerationPlugin, GenerationStatus};
pub use scheduler::{ChunkDispatch, ChunkStep, GenerationScheduler};
pub use session::{GenerationProgress, GenerationSession, PostprocessOutcome};
pub use state::GenerationState;
pub use workbench::{FrameReport, Workbench};
pub use sdf;

// Main exports for the engine
// Users should register:
// - FieldGenerationPlugin<B> for their compute backend B
// - Workbench<B> resource holding the backend and the generation sessions
// - optionally a GeneratorConfig resource to override the defaults
