//! When the first expansion pass runs

use docvar_registry::Settings;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Moment of the first expansion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupTrigger {
    /// Right away, without waiting for the page
    Immediate,
    /// Once the page finished loading
    OnLoad,
    /// Some time after the page finished loading
    OnLoadDelayed(Duration),
}

impl StartupTrigger {
    /// `<0` immediate, `0` on load, `>0` on load plus that many milliseconds
    #[must_use]
    pub fn from_delay_millis(delay: i64) -> Self {
        match delay {
            d if d < 0 => Self::Immediate,
            0 => Self::OnLoad,
            d => Self::OnLoadDelayed(Duration::from_millis(d.unsigned_abs())),
        }
    }

    /// Trigger configured by `delay_millis`
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::from_delay_millis(settings.delay_millis)
    }

    /// Wait as configured, then run `pass`
    ///
    /// `loaded` resolves when the page finished loading. It is dropped
    /// without being polled for [`StartupTrigger::Immediate`].
    pub async fn run_when_ready<L, F, T>(self, loaded: L, pass: F) -> T
    where
        L: Future<Output = ()>,
        F: FnOnce() -> T,
    {
        match self {
            Self::Immediate => {}
            Self::OnLoad => loaded.await,
            Self::OnLoadDelayed(delay) => {
                loaded.await;
                tokio::time::sleep(delay).await;
            }
        }
        debug!("Startup trigger {self:?} fired");
        pass()
    }
}
