/// Lifecycle of a generated field.
///
/// ```text
/// Empty -> Generating -> FinishedIteration -> Complete   (chunked mesh sources)
/// Empty -> Postprocessing -> Complete                   (single dispatch sources)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldState {
	#[default]
	Empty,
	Generating,
	FinishedIteration,
	Postprocessing,
	Complete,
}

impl FieldState {
	/// Starts generation. Chunked generations enter `Generating`, the rest go straight to
	/// `Postprocessing`. Returns false unless the field was `Empty`.
	pub fn begin(&mut self, chunked: bool) -> bool {
		if *self != FieldState::Empty {
			return false;
		}
		*self = if chunked { FieldState::Generating } else { FieldState::Postprocessing };
		true
	}

	/// Marks the last chunk as retired.
	pub fn finish_iteration(&mut self) -> bool {
		if *self != FieldState::Generating {
			return false;
		}
		*self = FieldState::FinishedIteration;
		true
	}

	pub fn awaits_postprocess(self) -> bool {
		matches!(self, FieldState::Postprocessing | FieldState::FinishedIteration)
	}

	pub fn complete(&mut self) -> bool {
		if !self.awaits_postprocess() {
			return false;
		}
		*self = FieldState::Complete;
		true
	}

	pub fn is_complete(self) -> bool {
		self == FieldState::Complete
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_chunked_path() -> Result<(), String> {
		let mut state = FieldState::default();
		assert!(state.begin(true));
		assert_eq!(state, FieldState::Generating);
		assert!(!state.awaits_postprocess());
		assert!(!state.complete());

		assert!(state.finish_iteration());
		assert!(state.awaits_postprocess());
		assert!(state.complete());
		assert!(state.is_complete());
		Ok(())
	}

	#[test]
	fn test_single_dispatch_path() -> Result<(), String> {
		let mut state = FieldState::Empty;
		assert!(state.begin(false));
		assert_eq!(state, FieldState::Postprocessing);
		assert!(!state.finish_iteration());
		assert!(state.complete());
		Ok(())
	}

	#[test]
	fn test_out_of_order_transitions_are_refused() -> Result<(), String> {
		let mut state = FieldState::Complete;
		assert!(!state.begin(true));
		assert!(!state.finish_iteration());
		assert!(!state.complete());
		assert_eq!(state, FieldState::Complete);

		let mut empty = FieldState::Empty;
		assert!(!empty.complete());
		assert!(!empty.finish_iteration());
		Ok(())
	}
}
