//! Rendezvous path resolution
//!
//! Owners and callers must agree on one filesystem path per (prefix, user)
//! pair; everything else in arbitration is answered by inspecting it.

use std::path::{Path, PathBuf};

/// Environment variables consulted, in order, for the invoking user's name.
const USER_ENV_VARS: &[&str] = &["USER", "LOGNAME", "USERNAME"];

/// Name used when no user variable is set.
const UNKNOWN_USER: &str = "unknown";

/// Compute the rendezvous path: `directory/.<prefix>.<user>`.
///
/// Pure; the same inputs always produce the same path.
pub fn rendezvous_path(directory: &Path, prefix: &str, user: &str) -> PathBuf {
    directory.join(format!(".{}.{}", prefix, user))
}

/// Name of the invoking user, taken from the environment.
pub fn current_user() -> String {
    USER_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| UNKNOWN_USER.to_string())
}

/// Identity of a rendezvous endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    prefix: String,
    user: String,
    directory: PathBuf,
}

impl Endpoint {
    pub fn new(
        prefix: impl Into<String>,
        user: impl Into<String>,
        directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            user: user.into(),
            directory: directory.into(),
        }
    }

    /// Endpoint in the invoking user's home directory.
    ///
    /// Falls back to the system temp directory when no home can be found.
    pub fn for_current_user(prefix: impl Into<String>) -> Self {
        let directory = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self::new(prefix, current_user(), directory)
    }

    /// Replace the directory the rendezvous file lives in.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path(&self) -> PathBuf {
        rendezvous_path(&self.directory, &self.prefix, &self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendezvous_path_format() {
        let path = rendezvous_path(Path::new("/home/alice"), "solo", "alice");
        assert_eq!(path, PathBuf::from("/home/alice/.solo.alice"));
    }

    #[test]
    fn test_rendezvous_path_is_stable() {
        let first = rendezvous_path(Path::new("/home/bob"), "player", "bob");
        let second = rendezvous_path(Path::new("/home/bob"), "player", "bob");
        assert_eq!(first, second);
    }

    #[test]
    fn test_rendezvous_path_differs_per_user() {
        let alice = rendezvous_path(Path::new("/tmp"), "solo", "alice");
        let bob = rendezvous_path(Path::new("/tmp"), "solo", "bob");
        assert_ne!(alice, bob);
    }

    #[test]
    fn test_endpoint_path_delegates() {
        let endpoint = Endpoint::new("solo", "carol", "/home/carol");
        assert_eq!(endpoint.path(), PathBuf::from("/home/carol/.solo.carol"));
        assert_eq!(endpoint.prefix(), "solo");
        assert_eq!(endpoint.user(), "carol");
    }

    #[test]
    fn test_endpoint_with_directory() {
        let endpoint = Endpoint::new("solo", "dave", "/home/dave").with_directory("/run/user/1000");
        assert_eq!(endpoint.directory(), Path::new("/run/user/1000"));
        assert_eq!(
            endpoint.path(),
            PathBuf::from("/run/user/1000/.solo.dave")
        );
    }

    #[test]
    fn test_current_user_not_empty() {
        assert!(!current_user().is_empty());
    }
}
