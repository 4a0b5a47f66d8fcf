use crate::offsets::{DispatchOffsets, InputAddressing};
use crate::state::GenerationState;
use bevy::prelude::*;

/// Outcome of one [`GenerationScheduler::advance_one_chunk`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStep {
	/// Nothing to do.
	Idle,
	/// First call after the last chunk was dispatched. Reported exactly once per generation.
	IterationFinished,
	/// A chunk was dispatched and more remain.
	Dispatched,
	/// The last chunk was dispatched; the state has been reset to idle.
	Completed,
}

impl ChunkStep {
	/// Whether the call dispatched work this frame.
	pub fn performed_work(self) -> bool {
		matches!(self, ChunkStep::Dispatched | ChunkStep::Completed)
	}
}

/// Everything a backend needs to run one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDispatch {
	/// Output voxels covered by the chunk.
	pub extent: UVec3,
	/// Input elements covered by the chunk.
	pub input_extent: UVec3,
	pub offsets: DispatchOffsets,
}

/// Drives a chunked generation one dispatch at a time.
#[derive(Debug, Clone, Default)]
pub struct GenerationScheduler {
	state: GenerationState,
	addressing: InputAddressing,
	previous_was_active: bool,
}

impl GenerationScheduler {
	pub fn new(state: GenerationState, addressing: InputAddressing) -> Self {
		Self { state, addressing, previous_was_active: false }
	}

	pub fn state(&self) -> &GenerationState {
		&self.state
	}

	pub fn addressing(&self) -> InputAddressing {
		self.addressing
	}

	/// Whether chunks remain to be dispatched.
	pub fn is_active(&self) -> bool {
		!self.state.is_output_exhausted()
	}

	pub fn progress_fraction(&self) -> Option<f32> {
		self.state.progress_fraction()
	}

	/// The chunk the next call to [`Self::advance_one_chunk`] would dispatch.
	pub fn next_dispatch(&self) -> Option<ChunkDispatch> {
		if !self.is_active() {
			return None;
		}
		Some(ChunkDispatch {
			extent: self.state.output_voxel_size,
			input_extent: self.state.input_voxel_size,
			offsets: self.addressing.offsets(&self.state),
		})
	}

	/// Dispatches the next chunk through `dispatch` and advances the indices.
	///
	/// The input index runs innermost; when it wraps the output index moves on. After the last
	/// chunk the state resets to idle and the following call reports
	/// [`ChunkStep::IterationFinished`]. When `dispatch` fails the indices stay where they were
	/// and the error is returned.
	pub fn advance_one_chunk<E>(
		&mut self,
		dispatch: impl FnOnce(&ChunkDispatch) -> Result<(), E>,
	) -> Result<ChunkStep, E> {
		let Some(chunk) = self.next_dispatch() else {
			if std::mem::take(&mut self.previous_was_active) {
				return Ok(ChunkStep::IterationFinished);
			}
			return Ok(ChunkStep::Idle);
		};

		dispatch(&chunk)?;
		self.previous_was_active = true;

		self.state.input_dispatch_index += 1;
		if self.state.is_input_exhausted() {
			self.state.input_dispatch_index = 0;
			self.state.output_dispatch_index += 1;
			log::debug!(
				"finished output chunk {}/{}",
				self.state.output_dispatch_index,
				self.state.output_dispatch_count
			);

			if self.state.is_output_exhausted() {
				self.state = GenerationState::default();
				return Ok(ChunkStep::Completed);
			}
		}

		Ok(ChunkStep::Dispatched)
	}

	/// Abandons the running generation without reporting a finished iteration.
	pub fn cancel(&mut self) {
		self.state = GenerationState::default();
		self.previous_was_active = false;
	}
}
