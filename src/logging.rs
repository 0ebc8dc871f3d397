use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::warn;
use crate::config::Config;

/// Installs the global fmt subscriber. Logs go to `config.log_file` when it
/// can be opened for appending, otherwise to stdout.
pub fn init(config: &Config) {
    let builder = tracing_subscriber::fmt().with_max_level(config.log_level);

    let Some(path) = &config.log_file else {
        builder.init();
        return;
    };

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        Err(e) => {
            builder.init();
            warn!("Error when opening log file {}: {}, logging to stdout", path.display(), e);
        }
    }
}
