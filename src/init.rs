use env_logger::Env;

/// Sets up logging. The filter defaults to `info` and can be overridden with
/// `RUST_LOG`.
pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}
