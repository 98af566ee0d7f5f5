use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::io;

const CRATE_TARGET: &str = "ev_dashboard";

fn crate_level(verbosity: usize) -> (LevelFilter, LevelFilter) {
    match verbosity {
        0 => (LevelFilter::Warn, LevelFilter::Warn),
        1 => (LevelFilter::Info, LevelFilter::Info),
        2 => (LevelFilter::Info, LevelFilter::Debug),
        _3_or_more => (LevelFilter::Info, LevelFilter::Trace),
    }
}

/// Drops the crate prefix from a log target, `ev_dashboard::merge` becomes `merge`.
fn short_target(target: &str) -> &str {
    match target.strip_prefix(CRATE_TARGET) {
        Some("") => "main",
        Some(rest) => rest.trim_start_matches("::"),
        None => target,
    }
}

/// Colored output on stdout and a plain `main.log` in `log_dir`.
/// The file always receives debug messages of this crate, stdout follows `verbosity`.
pub fn setup_logger(verbosity: usize, log_dir: &str) -> Result<(), fern::InitError> {
    std::fs::create_dir_all(log_dir)?;
    let log_file_path = format!("{}/main.log", log_dir);
    let (base_level, crate_level) = crate_level(verbosity);

    let colors_line = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::BrightWhite)
        .debug(Color::White)
        .trace(Color::BrightBlack);

    let file_config = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {} {} {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S,%f"),
                record.level(),
                short_target(record.target()),
                message
            ))
        })
        .level(LevelFilter::Info)
        .level_for(CRATE_TARGET, LevelFilter::Debug)
        .chain(fern::log_file(log_file_path)?);

    let stdout_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} {} {} {}",
                chrono::Utc::now().format("%H:%M:%S%.3f"),
                colors_line.color(record.level()),
                short_target(record.target()),
                message
            ));
        })
        .level(base_level)
        .level_for(CRATE_TARGET, crate_level)
        .chain(io::stdout());

    fern::Dispatch::new()
        .level(LevelFilter::Trace)
        .level_for("hyper", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(file_config)
        .chain(stdout_config)
        .apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(crate_level(0), (LevelFilter::Warn, LevelFilter::Warn));
        assert_eq!(crate_level(2), (LevelFilter::Info, LevelFilter::Debug));
        assert_eq!(crate_level(7), (LevelFilter::Info, LevelFilter::Trace));
    }

    #[test]
    fn targets_are_shortened() {
        assert_eq!(short_target("ev_dashboard::merge::sample"), "merge::sample");
        assert_eq!(short_target("ev_dashboard"), "main");
        assert_eq!(short_target("rouille"), "rouille");
    }
}
