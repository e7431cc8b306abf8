use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle, WriteMode};
use log::info;

/// Installs the stderr logger; the handle must outlive the run.
pub fn init(level: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    let handle = Logger::try_with_str(level)?
        .log_to_stderr()
        .write_mode(WriteMode::Direct)
        .format(flexi_logger::default_format)
        .start()?;
    info!(
        "event=app_start module=sim status=ok version={} level={}",
        env!("CARGO_PKG_VERSION"),
        level
    );
    Ok(handle)
}
