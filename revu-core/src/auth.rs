//! Stored sign-in credentials.
//!
//! Tokens live in a small JSON file next to the app config (`auth.json`).
//! Only the token pair is stored — the user profile is re-resolved from
//! `/users/me` on every startup so role or name changes are picked up.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Persisted token pair. Same shape as the sign-in response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAuth {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Reads stored credentials. A missing file is a normal signed-out state
/// (`Ok(None)`); a present-but-unreadable file is an error the caller may
/// treat as signed-out after logging it.
pub fn load(path: &Path) -> io::Result<Option<StoredAuth>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_slice(&bytes).map(Some).map_err(io::Error::other)
}

/// Writes credentials, creating the parent directory if needed. The file is
/// chmod 0600 on unix since it holds a live bearer token.
pub fn save(path: &Path, auth: &StoredAuth) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_vec_pretty(auth).map_err(io::Error::other)?;
    fs::write(path, json)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

/// Removes stored credentials. Already-absent is success.
pub fn clear(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");

        assert!(load(&path).unwrap().is_none(), "missing file should read as signed out");

        let auth = StoredAuth {
            access_token: "tok-123".to_owned(),
            refresh_token: Some("refresh-456".to_owned()),
        };
        save(&path, &auth).unwrap();

        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded.access_token, "tok-123");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh-456"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "auth file should not be group/world readable");
        }

        clear(&path).unwrap();
        assert!(load(&path).unwrap().is_none());
        clear(&path).unwrap(); // second clear is still fine
    }

    #[test]
    fn malformed_file_is_an_error_not_a_panic() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");
        fs::write(&path, b"not json").unwrap();
        assert!(load(&path).is_err());
    }
}
