mod outcome;
mod pipeline;

pub use outcome::RegistrationOutcome;
pub use pipeline::{AssetSettings, RegistrationOptions, RegistrationPipeline};
