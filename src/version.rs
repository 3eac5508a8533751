//! Locally installed version lookup

/// Source of the currently installed tool version
pub trait VersionSource: Send + Sync {
    fn current_version(&self) -> String;
}

/// Version baked in at compile time (or supplied by the embedding CLI)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersion {
    version: String,
}

impl PackageVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl Default for PackageVersion {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_VERSION"))
    }
}

impl VersionSource for PackageVersion {
    fn current_version(&self) -> String {
        self.version.clone()
    }
}

impl<F> VersionSource for F
where
    F: Fn() -> String + Send + Sync,
{
    fn current_version(&self) -> String {
        self()
    }
}
