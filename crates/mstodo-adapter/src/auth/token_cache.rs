/*
[INPUT]:  Token grants and cache storage directory
[OUTPUT]: Persisted bearer tokens for silent reuse across runs
[POS]:    Auth layer - persistent storage for acquired tokens
[UPDATE]: When cache format or file naming conventions change
*/

use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached token with metadata, one file per client id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl CachedToken {
    /// Check if the access token is past its expiry
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Manages persistence of acquired tokens
#[derive(Debug, Clone)]
pub struct TokenCache {
    cache_dir: PathBuf,
}

impl TokenCache {
    /// Create a new token cache with the given storage directory
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    /// Load the cached token for a client id, if any.
    ///
    /// Unreadable or malformed cache files read as a miss.
    pub fn load(&self, client_id: &str) -> Option<CachedToken> {
        let path = self.token_file_path(client_id);
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Save a token for a client id
    pub fn save(&self, client_id: &str, token: &CachedToken) -> io::Result<()> {
        if !self.cache_dir.exists() {
            fs::create_dir_all(&self.cache_dir)?;
        }

        let path = self.token_file_path(client_id);
        let encoded = serde_json::to_string_pretty(token)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&path, encoded)?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Remove the cached token for a client id
    pub fn clear(&self, client_id: &str) -> io::Result<()> {
        let path = self.token_file_path(client_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Get the expected file path for a client's cached token
    pub fn token_file_path(&self, client_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{}_token.json", client_id))
    }
}

/// Default cache directory: `./.mstodo-export/tokens` relative to the
/// current working directory.
pub(crate) fn default_cache_dir() -> PathBuf {
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    base_dir.join(".mstodo-export").join("tokens")
}
