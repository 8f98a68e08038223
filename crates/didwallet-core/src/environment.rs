//! Environment lookups: test pool address and client directories.

use std::path::PathBuf;

/// Environment variable holding the test pool address
pub const TEST_POOL_IP_VAR: &str = "TEST_POOL_IP";

/// Fallback pool address when the variable is unset
pub const DEFAULT_POOL_IP: &str = "127.0.0.1";

const CLIENT_DIR: &str = ".didwallet";
const TMP_DIR: &str = "didwallet";

/// Test pool address from `TEST_POOL_IP`, or localhost.
pub fn test_pool_ip() -> String {
    std::env::var(TEST_POOL_IP_VAR)
        .ok()
        .filter(|ip| !ip.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_POOL_IP.to_string())
}

/// Client home directory (`~/.didwallet`); current directory if home is unknown.
pub fn client_home_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CLIENT_DIR)
}

/// A file inside the client home directory.
pub fn client_home_file(name: &str) -> PathBuf {
    client_home_path().join(name)
}

/// Scratch directory under the system temp dir.
pub fn tmp_path() -> PathBuf {
    std::env::temp_dir().join(TMP_DIR)
}

/// A file inside the scratch directory.
pub fn tmp_file(name: &str) -> PathBuf {
    tmp_path().join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_paths() {
        assert!(client_home_path().ends_with(".didwallet"));
        assert_eq!(
            client_home_file("pool.txn"),
            client_home_path().join("pool.txn")
        );
    }

    #[test]
    fn test_tmp_paths() {
        assert!(tmp_path().starts_with(std::env::temp_dir()));
        assert!(tmp_file("x").ends_with("didwallet/x"));
    }

    #[test]
    fn test_pool_ip_is_never_empty() {
        // Either the configured value or the fallback
        assert!(!test_pool_ip().is_empty());
    }
}
