//! Logger setup for binaries and tests embedding the signer.

use log::LevelFilter;

/// Installs a global [`fern`] logger writing to stderr.
///
/// Lines are formatted as `<rfc3339 timestamp>  <LEVEL> <message>`.
///
/// # Errors
///
/// Returns [`log::SetLoggerError`] if a global logger is already installed.
pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}
