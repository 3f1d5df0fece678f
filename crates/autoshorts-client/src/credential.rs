//! API credential and its local persistence.
//!
//! Exactly one credential is kept, under a fixed key, in a small JSON file in
//! the user's config directory. The credential is handed to the client
//! explicitly; nothing reads the store at request time.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Key the credential is stored under.
pub const CREDENTIAL_KEY: &str = "monzed_api_key";

/// Bearer secret for the generation API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Trim the raw key; `None` if nothing is left.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short masked form for display, e.g. `monz…x9Qa`.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Persistent storage for the single credential.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> ClientResult<Option<Credential>>;
    fn save(&self, credential: &Credential) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    value: String,
    saved_at: DateTime<Utc>,
}

/// JSON file backed credential store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `AUTOSHORTS_CREDENTIAL_FILE`, or `<config dir>/autoshorts/credentials.json`.
    pub fn from_env() -> ClientResult<Self> {
        if let Some(path) = std::env::var_os("AUTOSHORTS_CREDENTIAL_FILE") {
            return Ok(Self::new(path));
        }
        let dir = dirs_next::config_dir()
            .ok_or_else(|| ClientError::invalid_config("no user config directory available"))?;
        Ok(Self::new(dir.join("autoshorts").join("credentials.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> ClientResult<BTreeMap<String, StoredCredential>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring unreadable credential file: {}", e);
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, StoredCredential>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> ClientResult<Option<Credential>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(CREDENTIAL_KEY)
            .and_then(|stored| Credential::new(&stored.value)))
    }

    fn save(&self, credential: &Credential) -> ClientResult<()> {
        let mut entries = self.read_entries()?;
        entries.insert(
            CREDENTIAL_KEY.to_string(),
            StoredCredential {
                value: credential.expose().to_string(),
                saved_at: Utc::now(),
            },
        );
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "Saved credential");
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(CREDENTIAL_KEY).is_none() {
            return Ok(());
        }
        if entries.is_empty() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        } else {
            self.write_entries(&entries)?;
        }
        debug!(path = %self.path.display(), "Cleared credential");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> ClientResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> ClientResult<()> {
    Ok(())
}

/// In-memory store, for tests and sessions that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            inner: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> ClientResult<Option<Credential>> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, credential: &Credential) -> ClientResult<()> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<S> {
    fn load(&self) -> ClientResult<Option<Credential>> {
        (**self).load()
    }

    fn save(&self, credential: &Credential) -> ClientResult<()> {
        (**self).save(credential)
    }

    fn clear(&self) -> ClientResult<()> {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_is_trimmed_and_redacted() {
        let cred = Credential::new("  monzed_sk_123456789  ").unwrap();
        assert_eq!(cred.expose(), "monzed_sk_123456789");
        assert_eq!(format!("{:?}", cred), "Credential(<redacted>)");
        assert_eq!(cred.masked(), "monz…6789");
        assert!(Credential::new("   ").is_none());
    }

    #[test]
    fn test_file_store_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("credentials.json"));

        assert!(store.load().unwrap().is_none());

        let cred = Credential::new("monzed_sk_abc").unwrap();
        store.save(&cred).unwrap();
        assert_eq!(store.load().unwrap(), Some(cred));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains(CREDENTIAL_KEY));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.path().exists());

        // Clearing twice is harmless.
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.save(&Credential::new("k-123").unwrap()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCredentialStore::new();
        store.save(&Credential::new("k").unwrap()).unwrap();
        assert!(store.load().unwrap().is_some());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
