//! Worker identity derivation
//!
//! A worker's identity is the canonicalized path of the configuration file
//! it was started from. Two start requests naming the same file (through
//! any mix of relative paths or symlinks) resolve to the same identity, so
//! the supervisor's registry sees them as one worker.

use std::path::Path;

use crate::error::ConfigResult;

/// Derive the registry identity for a configuration source
pub fn canonical_identity(path: impl AsRef<Path>) -> ConfigResult<String> {
    let canonical = std::fs::canonicalize(path.as_ref())?;
    Ok(canonical.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_relative_and_absolute_paths_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worker.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "worker: {{}}").unwrap();

        let absolute = canonical_identity(&path).unwrap();
        let indirect = canonical_identity(dir.path().join(".").join("worker.yaml")).unwrap();
        assert_eq!(absolute, indirect);
    }

    #[test]
    fn test_missing_file_fails() {
        let result = canonical_identity("/definitely/not/here.yaml");
        assert!(result.is_err());
    }
}
