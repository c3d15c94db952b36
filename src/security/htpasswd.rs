//! htpasswd credential files.
//!
//! Supported entry formats:
//! - bcrypt (`$2a$`, `$2b$`, `$2y$`), as written by `htpasswd -B`
//! - `{SHA}` base64 SHA-1, as written by `htpasswd -s`
//!
//! Any other hash is rejected at load time so a misconfigured user fails
//! loudly instead of never authenticating.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use sha1::{Digest, Sha1};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HtpasswdError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected user:hash")]
    Malformed { line: usize },

    #[error("user {user:?}: unsupported hash format (use bcrypt or {{SHA}})")]
    UnsupportedHash { user: String },

    #[error("user {user:?}: {{SHA}} hash is not a base64 SHA-1 digest")]
    BadSha { user: String },
}

#[derive(Debug, Clone)]
enum PasswordHash {
    Bcrypt(String),
    Sha1([u8; 20]),
}

impl PasswordHash {
    fn parse(user: &str, hash: &str) -> Result<Self, HtpasswdError> {
        if ["$2a$", "$2b$", "$2y$"].iter().any(|p| hash.starts_with(p)) {
            return Ok(Self::Bcrypt(hash.to_string()));
        }
        if let Some(encoded) = hash.strip_prefix("{SHA}") {
            let digest = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .ok()
                .and_then(|bytes| <[u8; 20]>::try_from(bytes).ok())
                .ok_or_else(|| HtpasswdError::BadSha {
                    user: user.to_string(),
                })?;
            return Ok(Self::Sha1(digest));
        }
        Err(HtpasswdError::UnsupportedHash {
            user: user.to_string(),
        })
    }

    fn verify(&self, password: &str) -> bool {
        match self {
            // A hash that bcrypt cannot parse never matches.
            Self::Bcrypt(hash) => bcrypt::verify(password, hash).unwrap_or(false),
            Self::Sha1(expected) => {
                let actual = Sha1::digest(password.as_bytes());
                constant_time_eq(actual.as_slice(), expected)
            }
        }
    }
}

/// Users and password hashes loaded from an htpasswd file.
#[derive(Debug, Clone, Default)]
pub struct Htpasswd {
    users: HashMap<String, PasswordHash>,
}

impl Htpasswd {
    pub fn load(path: &Path) -> Result<Self, HtpasswdError> {
        let content = fs::read_to_string(path).map_err(|source| HtpasswdError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Check a password. bcrypt entries are deliberately slow; call this
    /// off the async executor.
    pub fn verify(&self, user: &str, password: &str) -> bool {
        self.users
            .get(user)
            .is_some_and(|hash| hash.verify(password))
    }
}

impl std::str::FromStr for Htpasswd {
    type Err = HtpasswdError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let mut users = HashMap::new();
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (user, hash) = line
                .split_once(':')
                .filter(|(user, hash)| !user.is_empty() && !hash.is_empty())
                .ok_or(HtpasswdError::Malformed { line: i + 1 })?;
            users.insert(user.to_string(), PasswordHash::parse(user, hash)?);
        }
        Ok(Self { users })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
