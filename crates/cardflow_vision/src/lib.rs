//! Vision-model extraction: a capability interface, a model-chain
//! orchestrator, and the pure semantic gate applied to raw model output.

mod chain;
mod error;
mod gate;
mod openai;

pub use chain::{ChainVisionExtractor, FakeVisionExtractor, VisionExtractor};
pub use error::VisionError;
pub use gate::{apply_semantic_gate, GateConfig, QualityMap, RowQuality};
pub use openai::OpenAiVisionExtractor;

pub const PIPELINE_VERSION: &str = "2.0.0";
