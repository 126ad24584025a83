use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "scheduler.log";

/// Where and how much the kernel logs.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub log_dir: PathBuf,

    /// Also log to stderr, colored by level.
    pub console: bool,
}

impl LogSettings {
    /// Level from `RUST_LOG` (e.g. `RUST_LOG=debug`), defaulting to `info`.
    pub fn from_env() -> Self {
        let level = std::env::var("RUST_LOG").ok().and_then(|level| level.parse::<LevelFilter>().ok()).unwrap_or(LevelFilter::Info);
        Self { level, log_dir: PathBuf::from(DEFAULT_LOG_DIR), console: true }
    }
}

/// Initializes the global logger from the environment.
///
/// Call once at the very beginning of `main`. Logs go to the console and to
/// `logs/scheduler.log`.
pub fn init() {
    init_with(LogSettings::from_env());
}

pub fn init_with(settings: LogSettings) {
    if let Err(e) = fs::create_dir_all(&settings.log_dir) {
        eprintln!("Failed to create log directory at '{}': {}", settings.log_dir.display(), e);
    }
    let log_file_path = settings.log_dir.join(DEFAULT_LOG_FILE);

    let mut base_config = Dispatch::new().level(settings.level).level_for("serde", LevelFilter::Warn);

    if settings.console {
        let colors = ColoredLevelConfig::new()
            .error(Color::Red)
            .warn(Color::Yellow)
            .info(Color::Green)
            .debug(Color::Blue)
            .trace(Color::BrightBlack);

        let console_config = Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "[{} {} {}] {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    colors.color(record.level()),
                    record.target(),
                    message
                ))
            })
            .chain(std::io::stderr());
        base_config = base_config.chain(console_config);
    }

    match fern::log_file(&log_file_path) {
        Ok(file) => {
            let file_config = Dispatch::new()
                .format(|out, message, record| {
                    let thread = std::thread::current();
                    out.finish(format_args!(
                        "[{} {} {} {}] {}",
                        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                        record.level(),
                        thread.name().unwrap_or("unnamed"),
                        record.target(),
                        message
                    ))
                })
                .chain(file);
            base_config = base_config.chain(file_config);
        }
        Err(e) => eprintln!("Failed to open log file '{}': {}. Logging to console only.", log_file_path.display(), e),
    }

    if let Err(e) = base_config.apply() {
        eprintln!("Failed to apply logger configuration: {}", e);
        return;
    }

    log::info!("Logger initialized at level {}. Logging to '{}'.", settings.level, log_file_path.display());
}
