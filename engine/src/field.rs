use crate::desc::{FieldDataDesc, FieldKind, GenerationDesc, ProceduralSdf};
use crate::lifecycle::FieldState;

/// A generated signed distance field.
///
/// Sampled fields own a distance volume. Procedural fields carry the function instead. A mesh
/// generation also owns an accumulation volume until postprocessing releases it.
#[derive(Debug)]
pub struct Field<V> {
	pub desc: FieldDataDesc,
	pub model_name: String,
	/// Description the field was generated from, without source references.
	pub generation: GenerationDesc,
	pub(crate) procedural: Option<ProceduralSdf>,
	pub(crate) volume: Option<V>,
	pub(crate) accumulator: Option<V>,
	pub(crate) state: FieldState,
}

impl<V> Field<V> {
	pub(crate) fn new(desc: FieldDataDesc, model_name: String, generation: GenerationDesc) -> Self {
		Self {
			desc,
			model_name,
			generation,
			procedural: None,
			volume: None,
			accumulator: None,
			state: FieldState::Empty,
		}
	}

	pub fn state(&self) -> FieldState {
		self.state
	}

	pub fn volume(&self) -> Option<&V> {
		self.volume.as_ref()
	}

	pub fn accumulator(&self) -> Option<&V> {
		self.accumulator.as_ref()
	}

	pub fn procedural(&self) -> Option<&ProceduralSdf> {
		self.procedural.as_ref()
	}

	/// Whether the field can be sampled, either from its volume or its function.
	pub fn has_data(&self) -> bool {
		match self.desc.kind {
			FieldKind::Sampled => self.volume.is_some(),
			FieldKind::Procedural => self.procedural.is_some(),
		}
	}
}
