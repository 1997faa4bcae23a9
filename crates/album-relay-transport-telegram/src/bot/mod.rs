/// Conversion of Telegram messages into relay messages.
pub mod convert;
/// Recent history buffer of the source chat.
pub mod history;
/// Update intake and backlog drain.
pub mod ingest;
/// Bot API chat platform.
pub mod platform;

pub use history::RecentHistory;
pub use ingest::Ingest;
pub use platform::TelegramPlatform;
