use crate::config::data_dir;
use simplelog::*;
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Once, OnceLock};

static INIT: Once = Once::new();
static LOG_FILE: OnceLock<PathBuf> = OnceLock::new();
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Logs to `$HOME/.local/share/strumtrainer/logs/app.log`, or to stderr when
/// that file cannot be opened. Later calls are no-ops.
pub fn init_logger(verbose: bool) -> Result<(), Error> {
    let level = if verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };

    INIT.call_once(|| {
        let installed = match open_log_file() {
            Ok((path, file)) => {
                let config = ConfigBuilder::new()
                    .set_thread_level(LevelFilter::Error)
                    .build();
                let installed =
                    CombinedLogger::init(vec![WriteLogger::new(level, config, file)]).is_ok();
                if installed {
                    let _ = LOG_FILE.set(path);
                }
                installed
            }
            Err(e) => {
                let installed = env_logger::Builder::new()
                    .filter_level(level)
                    .parse_default_env()
                    .try_init()
                    .is_ok();
                log::warn!("Log file unavailable ({}), logging to stderr", e);
                installed
            }
        };
        LOGGER_INITIALIZED.store(installed, Ordering::SeqCst);
    });

    if LOGGER_INITIALIZED.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Other, "Logger initialization failed"))
    }
}

/// Path of the log file, when logging to one.
pub fn log_file() -> Option<PathBuf> {
    LOG_FILE.get().cloned()
}

fn open_log_file() -> Result<(PathBuf, fs::File), Error> {
    let log_dir = data_dir()
        .ok_or_else(|| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?
        .join("logs");
    fs::create_dir_all(&log_dir)?;

    let path = log_dir.join("app.log");
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

