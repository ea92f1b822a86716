//! Debug log bridge for canopy
//!
//! Routes every `log::info!()` etc. to `canopy_debug.log` in the system temp
//! directory (`/tmp/canopy_debug.log` on most Unix systems). When `RUST_LOG`
//! is set, lines are mirrored to stderr as well.
//!
//! Level precedence: `--log-level` flag, then `RUST_LOG`, then the config
//! file's `log_level` (applied later through [`apply_config_level`]).

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{LevelFilter, Log, Metadata, Record};

struct BridgeLogger {
    file: Mutex<Option<File>>,
    mirror_stderr: bool,
}

impl BridgeLogger {
    fn new(mirror_stderr: bool) -> Self {
        let file = match OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(log_path())
        {
            Ok(mut f) => {
                let _ = writeln!(
                    f,
                    "{}\ncanopy debug session started at {}\n{}",
                    "=".repeat(80),
                    get_timestamp(),
                    "=".repeat(80)
                );
                Some(f)
            }
            // Logging must never stop the maintainer
            Err(_) => None,
        };
        Self {
            file: Mutex::new(file),
            mirror_stderr,
        }
    }
}

impl Log for BridgeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            get_timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.write_all(line.as_bytes());
        }
        if self.mirror_stderr {
            eprint!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

static LOGGER: OnceLock<BridgeLogger> = OnceLock::new();
static LEVEL_PINNED: AtomicBool = AtomicBool::new(false);

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Location of the debug log file
pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("canopy_debug.log")
}

/// Install the log bridge.
///
/// `cli_level` (from `--log-level`) wins over `RUST_LOG`; either one pins the
/// level so the config file cannot lower or raise it afterwards.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_level = rust_log
        .as_deref()
        .and_then(|v| v.trim().parse::<LevelFilter>().ok());

    let level = match (cli_level, env_level) {
        (Some(level), _) | (None, Some(level)) => {
            LEVEL_PINNED.store(true, Ordering::SeqCst);
            level
        }
        (None, None) => LevelFilter::Info,
    };

    let logger = LOGGER.get_or_init(|| BridgeLogger::new(rust_log.is_some()));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(level);
    }
}

/// Apply the config file's level unless the CLI or `RUST_LOG` pinned one.
pub fn apply_config_level(level: LevelFilter) {
    if LEVEL_PINNED.load(Ordering::SeqCst) {
        log::debug!("Ignoring config log level {}: overridden", level);
        return;
    }
    log::set_max_level(level);
}
