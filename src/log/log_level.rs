/// Defines the severity levels for log messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Per-frame detail (keepalives, raw routing decisions).
    Trace,
    /// Useful when following a single call through the relay.
    Debug,
    /// Registrations, call phase changes, connections.
    Info,
    /// Dropped envelopes, rejected messages, failed deliveries.
    Warn,
    /// Failures that abort a call or a connection.
    Error,
}

impl LogLevel {
    /// Short uppercase tag used in log files.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}
