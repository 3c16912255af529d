mod record;
mod store;

pub use record::{Codecs, Resolution, VideoRecord};
pub use store::{JsonVideoStore, VideoStore, VideoStoreExt};
