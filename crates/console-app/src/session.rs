use std::fs;
use std::path::PathBuf;

/// Durable bearer-token store: one token in one file. A missing or blank
/// file means logged out; the token is never validated here, only kept.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    token: Option<String>,
}

impl SessionStore {
    /// Load the persisted session. Any read failure counts as "no
    /// session".
    pub fn load(path: PathBuf) -> Self {
        let token = match fs::read_to_string(&path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(_) => None,
        };

        Self { path, token }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Keep a token in memory and on disk. A blank token clears instead.
    /// Disk failures are logged and the in-memory session stays usable.
    pub fn set_token(&mut self, token: &str) {
        let token = token.trim();
        if token.is_empty() {
            self.clear();
            return;
        }

        self.token = Some(token.to_string());

        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                tracing::warn!("Could not create session directory: {}", err);
                return;
            }
        }
        if let Err(err) = fs::write(&self.path, token) {
            tracing::warn!("Could not persist session token: {}", err);
        }
    }

    /// Forget the session in memory and on disk.
    pub fn clear(&mut self) {
        self.token = None;
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Could not remove session token file: {}", err);
            }
        }
    }
}
