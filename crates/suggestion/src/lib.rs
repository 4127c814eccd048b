//! Hyperband suggestion engine.
//!
//! The engine is stateless in-process: per-call state is loaded from the
//! Manager's opaque suggestion-parameter store through the codec, advanced
//! one successive-halving step, and written back. See
//! [`hyperband::HyperbandSuggestion`] for the step machine.

pub mod bracket;
pub mod codec;
pub mod evaluator;
pub mod hyperband;
pub mod random;
pub mod state;


pub use bracket::BracketGenerator;
pub use evaluator::{Bracket, BracketEvaluator, TrialScore};
pub use hyperband::HyperbandSuggestion;
pub use random::RandomSampler;
pub use state::{HyperbandState, RawHyperbandState};
