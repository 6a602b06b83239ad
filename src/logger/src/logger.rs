use std::io::Write;

use env_logger::{fmt::Color, Builder, Env};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{Level, LevelFilter};
use once_cell::sync::OnceCell;

static INSTANCE: OnceCell<Logger> = OnceCell::new();

/// Global logging backend. Wraps an `env_logger` build with an
/// `indicatif::MultiProgress`, so progress bars emitted by the workers do not
/// garble regular log lines.
#[derive(Debug)]
pub struct Logger {
    multi_pg: MultiProgress,
}

impl Logger {
    /// Build and install the global logger.
    ///
    /// `verbosity` maps to a level filter (0: Error .. 4+: Trace). The
    /// `KINDRED_LOG` environment variable overrides it.
    pub fn init(verbosity: u8) {
        let env = Env::default().filter("KINDRED_LOG");
        let logger = Builder::new()
            .filter_level(Self::level_filter(verbosity))
            .format(|buf, record| {
                let mut level_style = buf.style();
                level_style
                    .set_color(Self::level_color(record.level()))
                    .set_bold(true);

                // Errors carry their emission site.
                let origin = match record.level() {
                    Level::Error => format!(
                        " ({}:{})",
                        record.file().unwrap_or("<unknown>"),
                        record.line().unwrap_or(0),
                    ),
                    _ => String::new(),
                };

                writeln!(
                    buf,
                    "{} [{: <5}] ({}){origin} {}",
                    chrono::Local::now().format("%H:%M:%S%.3f"),
                    level_style.value(record.level()),
                    record.target(),
                    record.args(),
                )
            })
            .parse_env(env)
            .build();

        let multi_pg = MultiProgress::new();
        LogWrapper::new(multi_pg.clone(), logger)
            .try_init()
            .expect("Failed to attach logger to the progress-bar drawer");
        INSTANCE.set(Self{multi_pg}).expect("Logger was initialized twice");
    }

    pub fn set_level(verbosity: u8) {
        log::set_max_level(Self::level_filter(verbosity));
    }

    /// Register a new progress bar spanning `len` work items.
    ///
    /// # Panics
    /// If called before [`Logger::init`].
    pub fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
        Self::try_progress_bar(len, message).expect("Uninitialized logger")
    }

    /// Like [`Logger::progress_bar`], but `None` when no logger is installed
    /// (e.g. within library tests).
    pub fn try_progress_bar(len: u64, message: &'static str) -> Option<ProgressBar> {
        let bar = ProgressBar::new(len).with_message(message);
        bar.set_style(
            ProgressStyle::with_template("{msg:<24} {bar:32} {pos}/{len} [{elapsed}]")
                .expect("Invalid progress bar template")
        );
        Some(INSTANCE.get()?.multi_pg.add(bar))
    }

    fn level_filter(verbosity: u8) -> LevelFilter {
        match verbosity {
            0           => LevelFilter::Error,
            1           => LevelFilter::Warn,
            2           => LevelFilter::Info,
            3           => LevelFilter::Debug,
            4..=u8::MAX => LevelFilter::Trace,
        }
    }

    fn level_color(level: Level) -> Color {
        match level {
            Level::Error => Color::Red,
            Level::Warn  => Color::Yellow,
            Level::Info  => Color::Green,
            Level::Debug => Color::Blue,
            Level::Trace => Color::Cyan,
        }
    }
}

/// Shorthand for [`Logger::init`], mapping `--verbose`/`--quiet` counts.
pub fn init_logger(verbosity: &u8) {
    Logger::init(*verbosity);
}
