//! Console logging shared by the binaries, tests and benches.

use flexi_logger::{DeferredNow, FlexiLoggerError, Logger, LoggerHandle};
use log::Record;

/// `HH:MM:SS [L] message`, coloured by level.
pub fn format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &Record,
) -> std::io::Result<()> {
    let style = flexi_logger::style(record.level());
    write!(
        w,
        "{} {pref}[{}] {}{suf}",
        now.format("%H:%M:%S"),
        &record.level().as_str()[0..1],
        record.args(),
        pref = style.prefix(),
        suf = style.suffix(),
    )
}

/// Logs to stdout, honouring `RUST_LOG` and falling back to `default_spec`.
pub fn start(default_spec: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(default_spec)?
        .write_mode(flexi_logger::WriteMode::SupportCapture)
        .log_to_stdout()
        .set_palette("196;208;3;7;8".to_owned())
        .format(format)
        .start()
}
