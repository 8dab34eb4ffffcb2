use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the global logger.
///
/// `verbose` lowers the default level to `debug`; `RUST_LOG` still wins when
/// set. Repeated calls are ignored so tests and the binary can both call it.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::from_env(Env::default().default_filter_or(level.to_string()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}
