use bevy::prelude::*;

/// Knobs of the generation workflow.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
	/// Triangles handed to a single mesh chunk dispatch.
	pub mesh_chunk_size: u32,
	/// Look up the camera position registered under the model name once a field completes.
	pub set_camera_on_generation: bool,
}

impl Default for GeneratorConfig {
	fn default() -> Self {
		Self { mesh_chunk_size: 8192, set_camera_on_generation: true }
	}
}
