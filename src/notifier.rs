//! Throttled update notification
//!
//! Compares the installed version with the latest published one and prints an
//! upgrade notice, at most once per cooldown interval. The last notification time
//! is kept in a [`KeyValueStore`] under [`LAST_NOTIFIED_AT_KEY`].
//!
//! Concurrent checks are not coordinated: two checks racing on the same store may
//! both read the old timestamp and both notify.

use crate::clock::{Clock, SystemClock};
use crate::registry::{npm_upgrade_hint, PublishedVersionSource, DEFAULT_PACKAGE};
use crate::store::{ConfigStore, KeyValueStore};
use crate::version::VersionSource;
use crate::Result;
use colored::Colorize;
use std::io::{self, Write};

/// Minimum gap between two notices (one day)
pub const CLI_UPDATE_CHECK_INTERVAL_MS: i64 = 24 * 60 * 60 * 1000;

/// Store key holding the last notification time in epoch milliseconds
pub const LAST_NOTIFIED_AT_KEY: &str = "lastCliUpdateNotifiedAt";

/// What a single check decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Installed and published versions are identical
    UpToDate,
    /// A newer version exists but a notice was shown too recently
    Suppressed { elapsed_ms: i64 },
    /// The notice was printed and the timestamp recorded
    Notified,
}

/// Checks for a newer published version and nags about it
pub struct UpdateNotifier<S = ConfigStore> {
    version: Box<dyn VersionSource>,
    registry: Box<dyn PublishedVersionSource>,
    store: S,
    clock: Box<dyn Clock>,
    output: Box<dyn Write + Send>,
    upgrade_hint: String,
}

impl<S: KeyValueStore> UpdateNotifier<S> {
    /// Create a notifier that prints to stdout and reads the system clock
    pub fn new(
        version: impl VersionSource + 'static,
        registry: impl PublishedVersionSource + 'static,
        store: S,
    ) -> Self {
        Self {
            version: Box::new(version),
            registry: Box::new(registry),
            store,
            clock: Box::new(SystemClock),
            output: Box::new(io::stdout()),
            upgrade_hint: npm_upgrade_hint(DEFAULT_PACKAGE),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Command suggested in the notice, e.g. `npm install -g zenn-cli@latest`
    pub fn with_upgrade_hint(mut self, hint: impl Into<String>) -> Self {
        self.upgrade_hint = hint.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one check, printing a notice if an update is due
    ///
    /// # Errors
    /// Propagates registry lookup, store and output failures unchanged.
    /// A registry failure aborts before anything is printed or stored.
    pub async fn check_and_notify(&mut self) -> Result<CheckOutcome> {
        let current = self.version.current_version();
        let published = self.registry.published_version().await?;

        if current == published {
            tracing::debug!(%current, "installed version is up to date");
            return Ok(CheckOutcome::UpToDate);
        }

        let last_notified_at = self.store.get(LAST_NOTIFIED_AT_KEY)?;
        let now = self.clock.now_millis();

        if let Some(last) = last_notified_at {
            let elapsed_ms = now.saturating_sub(last);
            // Exactly one interval after the last notice is still inside the cooldown
            if elapsed_ms <= CLI_UPDATE_CHECK_INTERVAL_MS {
                tracing::debug!(%current, %published, elapsed_ms, "update notice suppressed by cooldown");
                return Ok(CheckOutcome::Suppressed { elapsed_ms });
            }
        }

        let notice = format_notice(&current, &published, &self.upgrade_hint);
        writeln!(self.output, "{}", notice)?;
        self.output.flush()?;

        self.store.set(LAST_NOTIFIED_AT_KEY, now)?;
        tracing::debug!(%current, %published, notified_at = now, "update notice shown");

        Ok(CheckOutcome::Notified)
    }
}

/// Render the upgrade notice shown to the user
pub fn format_notice(current: &str, published: &str, upgrade_hint: &str) -> String {
    format!(
        "{}\n{}",
        format!("📦 New version available: {} → {}", current, published).cyan(),
        format!("💡 Run '{}' to upgrade.", upgrade_hint).yellow()
    )
}
