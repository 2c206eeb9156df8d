pub mod log;
pub mod telegram;

use std::future::Future;

use crate::error::NotifyError;

pub use self::log::LogNotifier;
pub use telegram::TelegramNotifier;

/// Sink for alert text. Delivery is best-effort; callers log failures and move on.
pub trait Notifier {
    fn send(&self, text: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// The configured sink, chosen at startup.
pub enum AnyNotifier {
    Telegram(TelegramNotifier),
    Log(LogNotifier),
}

impl AnyNotifier {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Telegram(_) => "telegram",
            Self::Log(_) => "log",
        }
    }
}

impl Notifier for AnyNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        match self {
            Self::Telegram(n) => n.send(text).await,
            Self::Log(n) => n.send(text).await,
        }
    }
}
