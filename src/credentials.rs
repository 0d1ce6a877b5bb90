// Credential store: the consumer key, access token and username live in a
// three-line text file (`~/.pocket` by default). The file is only ever
// rewritten as a whole, after a successful authentication.

use crate::error::{PocketError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File name used under the home directory when no path is configured.
pub const DEFAULT_FILE_NAME: &str = ".pocket";

/// What the API needs to authenticate every call on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub access_token: String,
    pub username: String,
}

impl Credentials {
    /// Read credentials from `path`.
    ///
    /// A missing file is not an error: it returns `Ok(None)` so the caller
    /// can start the interactive flow. Content is not validated; missing
    /// lines come back as empty fields.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PocketError::io("read credentials from", path, e)),
        };

        // `lines()` already strips both `\n` and `\r\n`.
        let mut lines = data.lines().map(str::to_owned);
        Ok(Some(Credentials {
            consumer_key: lines.next().unwrap_or_default(),
            access_token: lines.next().unwrap_or_default(),
            username: lines.next().unwrap_or_default(),
        }))
    }

    /// Overwrite `path` with the three fields, one per line.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = format!(
            "{}\n{}\n{}\n",
            self.consumer_key, self.access_token, self.username
        );
        fs::write(path, contents).map_err(|e| PocketError::io("write credentials to", path, e))?;
        restrict_permissions(path)
    }
}

/// `~/.pocket`, or `./.pocket` when the home directory can't be determined.
pub fn default_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(DEFAULT_FILE_NAME)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| PocketError::io("set permissions on", path, e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
