use crate::error::{BqFlowError, Result};

/// Fails unless `version` is a valid semantic version (`MAJOR.MINOR.PATCH[-pre][+build]`).
pub fn validate_version(version: &str) -> Result<()> {
    semver::Version::parse(version)
        .map(|_| ())
        .map_err(|e| BqFlowError::InvalidVersion(format!("'{}': {}", version, e)))
}

pub fn is_valid_version(version: &str) -> bool {
    semver::Version::parse(version).is_ok()
}
