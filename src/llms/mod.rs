//! Reply generation.
//!
//! - [`engine`] - The [`InferenceEngine`] boundary and [`EngineState`]
//! - [`synthesizer`] - Engine-backed and fallback reply synthesizers
//! - [`fallback_rules`] - Keyword table used without an engine
//! - [`streaming`] - Paced framing of a complete reply
//! - [`providers`] - Concrete engine implementations

pub mod engine;
pub mod fallback_rules;
pub mod providers;
pub mod streaming;
pub mod synthesizer;

pub use engine::{EngineState, InferenceEngine, SamplingParams};
pub use streaming::{FrameMode, FrameStream, FramerConfig, StreamFramer};
pub use synthesizer::{
    EngineBackedSynthesizer, FallbackSynthesizer, ResponseSynthesizer, UnavailableNotice,
};
