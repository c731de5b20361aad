//! Repository handle and versioned config.
//!
//! # Storage layout
//!
//! ```text
//! <root>/
//!   .wikivc/
//!     config.yaml      (version + remote endpoint — mode 0600)
//!     index.json       (page name → id + last synced revision)
//!     session.json     (cookie session, created by login — mode 0600)
//!     cache/
//!       pages/
//!         <pageid>.json
//!   <Page_Name>.wiki   (working files, tree may nest)
//! ```
//!
//! # Handle pattern
//!
//! A [`Repo`] is constructed exactly once per process — [`Repo::discover`]
//! walks up from the starting directory, [`Repo::init_at`] creates a fresh
//! layout — and is then passed by reference everywhere. Nothing else in the
//! workspace consults the current directory, so tests build repositories
//! inside a `TempDir` and never touch process-global state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};
use crate::types::{PageId, PageName};

/// Name of the control directory marking a repository root.
pub const CONTROL_DIR: &str = ".wikivc";

/// Extension of working files, without the dot.
pub const WIKI_EXT: &str = "wiki";

const CONFIG_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Remote endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Full URL of the service's `api.php` endpoint.
    pub api_url: String,
}

/// Root of the repository YAML config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    pub remote: RemoteConfig,
    /// Shell template for the external merge tool. `{local}`, `{remote}` and
    /// `{merged}` expand to the three file paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_tool: Option<String>,
}

impl Config {
    fn new(api_url: &str) -> Self {
        Self {
            version: CONFIG_VERSION,
            remote: RemoteConfig {
                api_url: api_url.to_owned(),
            },
            merge_tool: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Repo handle
// ---------------------------------------------------------------------------

/// An opened repository: the working-tree root plus its loaded config.
#[derive(Debug, Clone)]
pub struct Repo {
    root: PathBuf,
    config: Config,
}

impl Repo {
    /// Create a fresh repository layout rooted at `root`.
    ///
    /// Returns [`StoreError::AlreadyInitialized`] when `root` is already
    /// inside a repository (its own or an ancestor's).
    pub fn init_at(root: &Path, api_url: &str) -> Result<Repo, StoreError> {
        if let Some(existing) = find_root(root) {
            return Err(StoreError::AlreadyInitialized { root: existing });
        }

        let control = root.join(CONTROL_DIR);
        std::fs::create_dir_all(control.join("cache").join("pages"))
            .map_err(|e| io_err(&control, e))?;
        set_dir_permissions(&control)?;

        let repo = Repo {
            root: root.to_path_buf(),
            config: Config::new(api_url),
        };
        repo.save_config()?;
        Ok(repo)
    }

    /// Walk `start` and its parents for a `.wikivc` directory and open the
    /// repository found there.
    ///
    /// Returns [`StoreError::NotARepo`] when the walk exhausts the ancestry.
    pub fn discover(start: &Path) -> Result<Repo, StoreError> {
        let root = find_root(start).ok_or_else(|| StoreError::NotARepo {
            start: start.to_path_buf(),
        })?;
        let config_path = root.join(CONTROL_DIR).join("config.yaml");
        let contents =
            std::fs::read_to_string(&config_path).map_err(|e| io_err(&config_path, e))?;
        let config = serde_yaml::from_str(&contents).map_err(|e| StoreError::Config {
            path: config_path,
            source: e,
        })?;
        Ok(Repo { root, config })
    }

    /// Working-tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `<root>/.wikivc/`
    pub fn control_dir(&self) -> PathBuf {
        self.root.join(CONTROL_DIR)
    }

    /// `<root>/.wikivc/config.yaml`
    pub fn config_path(&self) -> PathBuf {
        self.control_dir().join("config.yaml")
    }

    /// `<root>/.wikivc/index.json`
    pub fn index_path(&self) -> PathBuf {
        self.control_dir().join("index.json")
    }

    /// `<root>/.wikivc/session.json`
    pub fn session_path(&self) -> PathBuf {
        self.control_dir().join("session.json")
    }

    /// `<root>/.wikivc/cache/pages/`
    pub fn cache_dir(&self) -> PathBuf {
        self.control_dir().join("cache").join("pages")
    }

    /// `<root>/.wikivc/cache/pages/<pageid>.json` — pure, no I/O.
    pub fn page_cache_path(&self, page: PageId) -> PathBuf {
        self.cache_dir().join(format!("{page}.json"))
    }

    /// `<root>/<filename>.wiki` for a page name — pure, no I/O.
    pub fn working_path(&self, name: &PageName) -> PathBuf {
        self.root
            .join(format!("{}.{}", name.to_filename(), WIKI_EXT))
    }

    /// Replace the merge-tool template in memory; callers persist with
    /// [`Repo::save_config`].
    pub fn set_merge_tool(&mut self, template: Option<String>) {
        self.config.merge_tool = template;
    }

    /// Atomically persist the config: serialize → `.yaml.tmp` sibling →
    /// `chmod 0600` → `rename`.
    pub fn save_config(&self) -> Result<(), StoreError> {
        let path = self.config_path();
        let tmp = path.with_extension("yaml.tmp");
        let yaml = serde_yaml::to_string(&self.config)?;
        std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
        set_file_permissions(&tmp)?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&path, e));
        }
        Ok(())
    }
}

fn find_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONTROL_DIR).is_dir())
        .map(Path::to_path_buf)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
pub(crate) fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))?;
    Ok(())
}
#[cfg(not(unix))]
pub(crate) fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
