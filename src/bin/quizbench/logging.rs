use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use crossterm::style::{Color, Stylize};
use flexi_logger::{
    detailed_format, Cleanup, Criterion, DeferredNow, Duplicate, FileSpec, FormatFunction, Logger,
    LoggerHandle, Naming,
};
use log::Record;
use quizbench::dispatcher::{ANSWER_LOG_TARGET, QUESTION_LOG_TARGET};
use quizbench::retry::RETRY_LOG_TARGET;

use crate::config::{ConfigPaths, LoggingConfig};

/// Starts file logging with info+ echoed to stderr. Keep the handle alive until exit.
pub fn init_logging(config: &LoggingConfig, paths: &ConfigPaths) -> anyhow::Result<LoggerHandle> {
    let log_path = config
        .path
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.default_log_file());
    let directory = log_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or(paths.logs_dir.clone());
    let basename = log_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("quizbench")
        .to_string();
    let console: FormatFunction = if std::io::stderr().is_terminal() {
        colored_console_format
    } else {
        plain_console_format
    };
    let handle = Logger::try_with_env_or_str(&config.level)?
        .log_to_file(FileSpec::default().directory(directory).basename(basename))
        .format_for_files(detailed_format)
        .duplicate_to_stderr(Duplicate::Info)
        .format_for_stderr(console)
        .rotate(
            Criterion::Size(config.rotate_size),
            Naming::Numbers,
            Cleanup::KeepLogFiles(config.rotate_keep),
        )
        .start()?;
    Ok(handle)
}

fn target_color(target: &str) -> Option<Color> {
    match target {
        QUESTION_LOG_TARGET => Some(Color::DarkGrey),
        ANSWER_LOG_TARGET => Some(Color::Cyan),
        RETRY_LOG_TARGET => Some(Color::Yellow),
        _ => None,
    }
}

fn colored_console_format(
    w: &mut dyn Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> std::io::Result<()> {
    let message = record.args().to_string();
    match target_color(record.target()) {
        Some(color) => write!(w, "{}", message.with(color)),
        None => write!(w, "{message}"),
    }
}

fn plain_console_format(
    w: &mut dyn Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> std::io::Result<()> {
    write!(w, "{}", record.args())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_to_colors() {
        assert_eq!(target_color("quizbench::question"), Some(Color::DarkGrey));
        assert_eq!(target_color("quizbench::answer"), Some(Color::Cyan));
        assert_eq!(target_color("quizbench::retry"), Some(Color::Yellow));
        assert_eq!(target_color("quizbench::client"), None);
    }
}
