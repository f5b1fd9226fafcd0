//! Alert sinks: Telegram bot, structured log, and a bounded delivery queue.

pub mod log;
pub mod queue;
pub mod telegram;

pub use self::log::LogSink;
pub use queue::QueuedAlertSink;
pub use telegram::TelegramSink;
