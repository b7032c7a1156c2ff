use crate::log::log_level::LogLevel;

/// Destination for log lines emitted by the relay and the call client.
///
/// Every long-lived component holds an `Arc<dyn LogSink>` so tests can plug
/// in [`NoopLogSink`](crate::log::NoopLogSink) or a capturing sink.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}
