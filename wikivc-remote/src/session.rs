//! Persisted cookie session.
//!
//! The service hands out session cookies on login; we capture every
//! `Set-Cookie` the transport sees into a name → value jar, persist it as a
//! JSON document next to the other control files, and replay it as a single
//! `Cookie` header on each request. The jar keeps no expiry or path
//! attributes; every request goes to the one configured endpoint.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, RemoteError};

const SESSION_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    cookies: BTreeMap<String, String>,
}

/// Cookie jar bound to its on-disk location.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    cookies: BTreeMap<String, String>,
}

impl SessionStore {
    /// Load the session at `path`, or start an empty one if the file does
    /// not yet exist.
    pub fn load(path: PathBuf) -> Result<SessionStore, RemoteError> {
        if !path.exists() {
            return Ok(SessionStore {
                path,
                cookies: BTreeMap::new(),
            });
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let file: SessionFile = serde_json::from_str(&contents)?;
        Ok(SessionStore {
            path,
            cookies: file.cookies,
        })
    }

    /// Save the jar atomically: pretty JSON → `.json.tmp` sibling →
    /// `chmod 0600` → `rename`.
    pub fn save(&self) -> Result<(), RemoteError> {
        let file = SessionFile {
            version: SESSION_VERSION,
            cookies: self.cookies.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        set_file_permissions(&tmp)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }
        Ok(())
    }

    /// The `Cookie` request-header value, or `None` when the jar is empty.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }

    /// Capture cookies from a response. Returns `true` when the jar changed
    /// and needs saving.
    pub fn absorb(&mut self, response: &ureq::Response) -> bool {
        self.absorb_headers(response.all("set-cookie").into_iter())
    }

    fn absorb_headers<'a>(&mut self, headers: impl Iterator<Item = &'a str>) -> bool {
        let mut changed = false;
        for header in headers {
            let Some((name, value)) = parse_set_cookie(header) else {
                continue;
            };
            if self.cookies.get(&name).map(String::as_str) != Some(value.as_str()) {
                self.cookies.insert(name, value);
                changed = true;
            }
        }
        changed
    }
}

/// First `name=value` pair of a `Set-Cookie` header value; attributes after
/// the first `;` are dropped.
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_owned(), value.trim().to_owned()))
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RemoteError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RemoteError> {
    Ok(())
}
