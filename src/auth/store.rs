use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bundle::CredentialBundle;
use super::error::AuthError;

const CREDENTIAL_FILE_VERSION: u32 = 1;

/// Durable medium that holds at most one credential bundle.
///
/// Implementations report failures; [`TokenStore`] decides how to degrade.
pub trait CredentialStorage: Send + Sync {
    fn load(&self) -> Result<Option<CredentialBundle>, AuthError>;
    fn save(&self, bundle: &CredentialBundle) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// File-backed storage using a TOML document written atomically.
///
/// # Example
/// ```no_run
/// use jobmatch_client::auth::{CredentialBundle, CredentialStorage, FileStorage};
///
/// let storage = FileStorage::new_default();
/// storage.save(&CredentialBundle::new("access", "refresh", 3600)?)?;
/// # Ok::<(), jobmatch_client::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn new_default() -> Self {
        Self::new(default_credential_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStorage for FileStorage {
    fn load(&self) -> Result<Option<CredentialBundle>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: CredentialFile = toml::from_str(&raw)?;
        if file.version != CREDENTIAL_FILE_VERSION {
            return Err(AuthError::Serialization(format!(
                "unsupported credentials file version {} at {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(Some(file.bundle))
    }

    fn save(&self, bundle: &CredentialBundle) -> Result<(), AuthError> {
        let file = CredentialFile {
            version: CREDENTIAL_FILE_VERSION,
            saved_at: Utc::now(),
            bundle: bundle.clone(),
        };
        let serialized = toml::to_string(&file)?;
        atomic_write(&self.path, serialized.as_bytes())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

/// In-process storage. Nothing survives the process; useful for tests and
/// short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    bundle: Mutex<Option<CredentialBundle>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(bundle: CredentialBundle) -> Self {
        Self {
            bundle: Mutex::new(Some(bundle)),
        }
    }
}

impl CredentialStorage for MemoryStorage {
    fn load(&self) -> Result<Option<CredentialBundle>, AuthError> {
        let guard = self
            .bundle
            .lock()
            .map_err(|_| AuthError::Io("memory storage lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, bundle: &CredentialBundle) -> Result<(), AuthError> {
        let mut guard = self
            .bundle
            .lock()
            .map_err(|_| AuthError::Io("memory storage lock poisoned".to_string()))?;
        *guard = Some(bundle.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut guard = self
            .bundle
            .lock()
            .map_err(|_| AuthError::Io("memory storage lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Infallible view over a [`CredentialStorage`].
///
/// Storage failures never reach the caller: reads degrade to "absent" and a
/// failed write falls back to clearing, which pushes the client onto the
/// unauthenticated path instead of leaving a stale bundle behind.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn CredentialStorage>,
    skew: Duration,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn CredentialStorage>, skew: Duration) -> Self {
        Self { storage, skew }
    }

    pub fn in_memory(skew: Duration) -> Self {
        Self::new(Arc::new(MemoryStorage::new()), skew)
    }

    pub fn skew(&self) -> Duration {
        self.skew
    }

    pub fn get(&self) -> Option<CredentialBundle> {
        match self.storage.load() {
            Ok(bundle) => bundle,
            Err(err) => {
                tracing::warn!(error = %err, "credential storage unreadable, treating as logged out");
                None
            }
        }
    }

    /// Replace the stored bundle. Returns whether the write was persisted.
    pub fn set(&self, bundle: &CredentialBundle) -> bool {
        match self.storage.save(bundle) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist credentials");
                self.clear();
                false
            }
        }
    }

    pub fn clear(&self) {
        if let Err(err) = self.storage.clear() {
            tracing::warn!(error = %err, "failed to clear credential storage");
        }
    }

    /// `true` when no bundle is stored.
    pub fn is_expired(&self) -> bool {
        self.get()
            .map(|bundle| bundle.is_expired_at(Utc::now()))
            .unwrap_or(true)
    }

    /// `true` when no bundle is stored.
    pub fn is_near_expiry(&self) -> bool {
        self.get()
            .map(|bundle| bundle.is_near_expiry_at(Utc::now(), self.skew))
            .unwrap_or(true)
    }

    /// Zero when no bundle is stored.
    pub fn time_until_expiry(&self) -> Duration {
        self.get()
            .map(|bundle| bundle.time_until_expiry_at(Utc::now()))
            .unwrap_or(Duration::ZERO)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("storage", &"..")
            .field("skew", &self.skew)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialFile {
    version: u32,
    saved_at: DateTime<Utc>,
    bundle: CredentialBundle,
}

/// `~/.jobmatch/credentials.toml`, or `.jobmatch/credentials.toml` without a home dir.
pub fn default_credential_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".jobmatch"))
        .unwrap_or_else(|| PathBuf::from(".jobmatch"))
        .join("credentials.toml")
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path.file_name().ok_or_else(|| {
        AuthError::Io(format!("credential path {} has no file name", path.display()))
    })?;

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_name = format!(
        ".{}.tmp-{}-{nonce}",
        file_name.to_string_lossy(),
        std::process::id()
    );
    let temp_path = path.with_file_name(temp_name);

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let write_result = (|| -> std::io::Result<()> {
        let mut temp_file = options.open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }

    #[cfg(unix)]
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;

    Ok(())
}
