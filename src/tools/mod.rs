mod cpu_count;
mod ffprobe_info;
mod file_hasher;
mod file_tools;
mod id_lock;
mod path_validator;
mod tool_locator;
mod video_scanner;

pub use cpu_count::host_cpu_count;
pub(crate) use ffprobe_info::spawn_error;
pub use ffprobe_info::{FfprobeInspector, MediaInfo, MediaInspector};
pub use file_hasher::{CONTENT_ID_LEN, compute_id, is_valid_id};
pub use file_tools::{discard_dir, discard_file, remove_file_if_exists, write_atomic};
pub use id_lock::{IdGuard, IdLocks};
pub use path_validator::{
    absolutize, ensure_directory_exists, make_relative, resolve_relative,
    validate_directory_exists,
};
pub use tool_locator::ToolPaths;
pub use video_scanner::scan_video_files;
