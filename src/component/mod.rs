//! Ingest building blocks: registration, generated assets, annotations and
//! batch execution.

pub mod annotations;
pub mod asset_generator;
pub mod batch;
pub mod registration;
pub mod storyboard_builder;

pub use batch::{BatchItem, BatchOrchestrator, BatchRun};
pub use registration::{RegistrationOptions, RegistrationOutcome, RegistrationPipeline};
pub use storyboard_builder::{StoryboardBuilder, StoryboardOutcome};
