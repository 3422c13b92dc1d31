use anyhow::Result;
use fern::colors::{Color, ColoredLevelConfig};
use std::path::PathBuf;

/// Maps the number of `-v` flags to a stderr log level.
pub fn verbosity_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Installs the global logger. `file` receives Info and above when set;
/// stderr gets whatever `stderr_level` allows.
pub fn init_logger(file: Option<PathBuf>, stderr_level: log::LevelFilter) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::White)
        .trace(Color::BrightBlack);

    let file_level = if file.is_some() {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };

    let mut dispatch = fern::Dispatch::new().level(file_level.max(stderr_level));

    if let Some(path) = file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .level(file_level)
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{}[{}][{}]   {}",
                        chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                        record.target(),
                        record.level(),
                        message
                    ))
                })
                .chain(fern::log_file(path)?),
        );
    }

    if stderr_level != log::LevelFilter::Off {
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .level(stderr_level)
                .format(move |out, message, record| {
                    out.finish(format_args!(
                        "{}[{}]   {}",
                        chrono::Local::now().format("[%H:%M:%S]"),
                        colors.color(record.level()),
                        message
                    ))
                })
                .chain(std::io::stderr()),
        );
    }

    dispatch.apply()?;
    Ok(())
}
