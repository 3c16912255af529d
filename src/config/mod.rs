pub mod layout;
pub mod load;
pub mod save;
pub mod types;

pub use layout::RepoLayout;
pub use types::{CONFIG_FILE_NAME, Config, KeyframeStrategy, REPO_DIR_NAME, StoryboardSettings};
