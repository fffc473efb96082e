use env_logger::Target;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Initialise `env_logger`.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `verbose`.
/// With a log file the output is appended there, falling back to stderr if
/// the file cannot be opened.
pub fn init_with(log_file: Option<PathBuf>, verbose: bool) {
    let target = log_file
        .and_then(|path| {
            (|| -> io::Result<Target> {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let file = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)?;
                Ok(Target::Pipe(Box::new(file)))
            })()
            .ok()
        })
        .unwrap_or(Target::Stderr);

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).target(target);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    // A second init (tests) is harmless.
    let _ = builder.try_init();
}
