use colored::{ColoredString, Colorize};
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

fn level_tag(level: Level) -> Option<ColoredString> {
    match level {
        Level::Error => Some("ERROR".red()),
        Level::Warn => Some("WARN".yellow()),
        Level::Debug => Some("DEBUG".dimmed()),
        Level::Info | Level::Trace => None,
    }
}

/// Level defaults plus the colored format, before any `RUST_LOG` directives.
fn default_builder(verbose: bool) -> Builder {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .filter_module(&env!("CARGO_PKG_NAME").replace('-', "_"), level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME").cyan();
            match level_tag(record.level()) {
                Some(tag) => writeln!(
                    buf,
                    "[{} {} {}] {}",
                    name,
                    tag,
                    record.target().white(),
                    record.args()
                ),
                None => writeln!(buf, "[{}] {}", name, record.args()),
            }
        });
    builder
}

/// Install the process logger. Our crate logs at info (debug when `verbose`); dependencies at warn.
/// `RUST_LOG` is parsed after these defaults, so its directives replace them for the same target.
/// Safe to call more than once; later calls are ignored.
pub fn setup_logging(verbose: bool) {
    let _ = default_builder(verbose).parse_default_env().try_init();
}
