//! Command dispatch with delayed reconciliation
//!
//! The speaker applies commands asynchronously, so a poll issued right after
//! a command still shows the old state. Commands therefore run through
//! [`dispatch`], which waits a per-command settle delay before asking for a
//! fresh poll.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::Result;

/// Groups of commands sharing a settle delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// turn_on / turn_off
    Power,
    /// select_source
    SourceSelect,
    /// play / pause / play_pause
    PlayPause,
    /// next / previous track
    TrackSkip,
    /// set / step volume
    Volume,
    /// mute / unmute
    Mute,
}

impl CommandClass {
    /// Wait before the follow-up poll, or `None` when the command's effect is
    /// echoed locally and left to the next regular poll
    pub fn settle_delay(self) -> Option<Duration> {
        match self {
            CommandClass::Power => Some(Duration::from_secs(5)),
            CommandClass::SourceSelect => Some(Duration::from_millis(500)),
            CommandClass::PlayPause => Some(Duration::from_millis(250)),
            CommandClass::TrackSkip => Some(Duration::from_millis(1500)),
            CommandClass::Volume | CommandClass::Mute => None,
        }
    }
}

/// Handle to a follow-up poll scheduled by [`dispatch`]
#[derive(Debug)]
pub struct PendingRefresh(Option<JoinHandle<()>>);

impl PendingRefresh {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_scheduled(&self) -> bool {
        self.0.is_some()
    }

    /// Wait for the follow-up poll to finish (immediately if none)
    pub async fn settled(self) {
        if let Some(handle) = self.0 {
            // A panicking refresh only loses that refresh
            let _ = handle.await;
        }
    }
}

/// Run `command`, then after `settle` run `refresh` in the background
///
/// The refresh only runs if the command succeeded. The wait does not block
/// the caller: the returned [`PendingRefresh`] can be awaited or dropped.
pub async fn dispatch<C, R, RF>(settle: Option<Duration>, command: C, refresh: R) -> Result<PendingRefresh>
where
    C: Future<Output = Result<()>>,
    R: FnOnce() -> RF + Send + 'static,
    RF: Future<Output = ()> + Send + 'static,
{
    command.await?;

    let Some(delay) = settle else {
        return Ok(PendingRefresh::none());
    };

    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        refresh().await;
    });

    Ok(PendingRefresh(Some(handle)))
}
