use serde::{Deserialize, Serialize};

/// Version token of a sheet or session record, used for optimistic
/// concurrency control.
///
/// A resource that has never been written is at version 0. Every accepted
/// write bumps the version by one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version (0) of a resource that was never written.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the version (1) after the first write.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_start_at_zero_and_increment() {
        assert_eq!(Version::default(), Version::initial());
        assert_eq!(Version::initial().next(), Version::first());
        assert_eq!(Version::first().next().as_i64(), 2);
    }

    #[test]
    fn versions_are_ordered() {
        assert!(Version::new(3) > Version::new(2));
    }
}
