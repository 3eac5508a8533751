// update-notifier - Throttled CLI update notifications
// Compares the installed version against the published one and nags at most once per cooldown

pub mod clock;
pub mod config;
pub mod notifier;
pub mod registry;
pub mod store;
pub mod version;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{NotifierConfig, RegistryKind};
pub use notifier::{CheckOutcome, UpdateNotifier, CLI_UPDATE_CHECK_INTERVAL_MS, LAST_NOTIFIED_AT_KEY};
pub use registry::{GithubReleases, NpmRegistry, PublishedVersionSource, RegistryError};
pub use store::{ConfigStore, KeyValueStore, MemoryStore, StoreError};
pub use version::{PackageVersion, VersionSource};
