use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_PATH: &str = "/tmp/inscribe.log";

/// Route log output to a file so it never draws over the raw-mode terminal.
/// If the file cannot be opened, fall back to stderr.
pub fn init(log_file: Option<&Path>) {
    use env_logger::Target;

    let path = log_file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));

    let target = (|| -> io::Result<Target> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Target::Pipe(Box::new(file)))
    })()
    .unwrap_or(Target::Stderr);

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(target)
        .init();
}
