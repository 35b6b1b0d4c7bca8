//! Token file storage.
//!
//! Token sets live in a single JSON file readable only by its owner. Saving
//! writes a temporary file next to the target, restricts it to mode 0600 and
//! renames it over the target, so readers never observe a partially written
//! or world-readable file.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::auth::tokens::TokenSet;
use crate::error::{CheckinError, Result};

/// Trait for token storage operations (enables mocking).
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore {
    /// Loads the stored token set.
    ///
    /// # Errors
    ///
    /// Returns [`CheckinError::TokenFileMissing`] if nothing is stored,
    /// [`CheckinError::TokenFileCorrupt`] if the stored data is not a token set.
    fn load(&self) -> Result<TokenSet>;

    /// Replaces the stored token set.
    ///
    /// # Errors
    ///
    /// Returns [`CheckinError::TokenFileError`] if the file cannot be written.
    fn save(&self, tokens: &TokenSet) -> Result<()>;

    /// Location of the stored tokens, for messages.
    fn location(&self) -> PathBuf;
}

/// JSON file token storage.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn file_error(&self, source: std::io::Error) -> CheckinError {
        CheckinError::TokenFileError {
            path: self.path.clone(),
            source,
        }
    }

    /// Directory the temporary file is created in; must share the target's filesystem.
    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<TokenSet> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CheckinError::TokenFileMissing(self.path.clone()));
            },
            Err(e) => return Err(self.file_error(e)),
        };

        serde_json::from_str(&contents).map_err(|e| CheckinError::TokenFileCorrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn save(&self, tokens: &TokenSet) -> Result<()> {
        let mut json = serde_json::to_string_pretty(tokens)?;
        json.push('\n');

        let dir = self.parent_dir();
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| self.file_error(e))?;
        }

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.file_error(e))?;
        restrict_to_owner(tmp.path()).map_err(|e| self.file_error(e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| self.file_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.file_error(e.error))?;

        tracing::debug!(path = %self.path.display(), "Token file written");
        Ok(())
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_tokens() -> TokenSet {
        serde_json::from_value(json!({
            "access_token": "a1",
            "refresh_token": "r1",
            "id_token": "i1",
            "expires_in": 3600,
            "refresh_expires_in": 0,
            "token_type": "Bearer",
            "session_state": "abc",
            "nested": {"k": [1, 2, 3]}
        }))
        .unwrap()
    }

    #[test]
    fn save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("tokens.json"));

        let tokens = sample_tokens();
        store.save(&tokens).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, tokens);

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.location()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::to_value(&tokens).unwrap());
    }

    #[test]
    fn save_keeps_nulls_and_float_lifetimes() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("tokens.json"));

        let payload = json!({
            "access_token": "a1",
            "id_token": null,
            "refresh_token": "r1",
            "expires_in": 3600.0
        });
        let tokens: TokenSet = serde_json::from_value(payload.clone()).unwrap();
        store.save(&tokens).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.location()).unwrap()).unwrap();
        assert_eq!(raw, payload);
        assert_eq!(store.load().unwrap(), tokens);
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("tokens.json"));
        store.save(&sample_tokens()).unwrap();

        let mode = fs::metadata(store.location()).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[cfg(unix)]
    #[test]
    fn save_tightens_existing_world_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tokens.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        FileTokenStore::new(&path).save(&sample_tokens()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn save_replaces_whole_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("tokens.json"));
        store.save(&sample_tokens()).unwrap();

        let smaller: TokenSet = serde_json::from_value(json!({"access_token": "a2"})).unwrap();
        store.save(&smaller).unwrap();

        assert_eq!(store.load().unwrap(), smaller);
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn save_creates_missing_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("nested").join("tokens.json"));

        store.save(&sample_tokens()).unwrap();
        assert!(store.location().exists());
    }

    #[test]
    fn load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(temp_dir.path().join("absent.json"));

        assert!(matches!(store.load(), Err(CheckinError::TokenFileMissing(_))));
    }

    #[test]
    fn load_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tokens.json");
        fs::write(&path, "not json").unwrap();

        let result = FileTokenStore::new(&path).load();
        assert!(matches!(result, Err(CheckinError::TokenFileCorrupt { .. })));
    }

    #[test]
    fn load_rejects_json_without_access_token() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tokens.json");
        fs::write(&path, r#"{"refresh_token": "r1"}"#).unwrap();

        let result = FileTokenStore::new(&path).load();
        assert!(matches!(result, Err(CheckinError::TokenFileCorrupt { .. })));
    }
}
