//! Restricted access to the registry directory.
//!
//! The registry is addressed through the `libraries-registry://` scheme. Reads
//! and writes are confined to the configured root, and the directory is never
//! exposed through a public URL.
//!
//! # Addressing
//!
//! - `libraries-registry://colorbox.json` maps to `<root>/colorbox.json`
//! - absolute paths, `..` components and other schemes are rejected
//! - symlinks whose real path leaves the root are rejected

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Where normalized definitions get written.
pub trait RegistryStorage {
    /// Write `contents` to `filename` under the registry root, replacing any
    /// existing file. Returns the local path on success.
    fn write(&self, filename: &str, contents: &[u8]) -> Result<PathBuf>;
}

/// One registry directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub uri: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Path-restricted accessor for a registry directory.
#[derive(Debug, Clone)]
pub struct RegistryStream {
    scheme: String,
    root: PathBuf,
}

impl RegistryStream {
    pub fn new(config: RegistryConfig) -> Self {
        RegistryStream {
            scheme: config.scheme,
            root: config.root,
        }
    }

    pub fn name(&self) -> &'static str {
        crate::config::RegistryConstants::DISPLAY_NAME
    }

    pub fn description(&self) -> &'static str {
        crate::config::RegistryConstants::DESCRIPTION
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Local directory backing the scheme.
    pub fn directory_path(&self) -> &Path {
        &self.root
    }

    /// Build a scheme URI for a path relative to the root.
    pub fn uri(&self, relative: &str) -> String {
        format!("{}://{}", self.scheme, relative.trim_start_matches('/'))
    }

    /// Map a scheme URI to a local path inside the root.
    pub fn resolve(&self, uri: &str) -> Result<PathBuf> {
        let prefix = format!("{}://", self.scheme);
        let target = uri
            .strip_prefix(&prefix)
            .ok_or_else(|| RegistryError::InvalidUri { uri: uri.to_string() })?;

        let mut resolved = self.root.clone();
        for component in Path::new(target).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(RegistryError::PathEscapesRoot { uri: uri.to_string() });
                }
            }
        }

        // Symlinks inside the root must not lead out of it.
        let real_root = real_path(&self.root)
            .map_err(|e| RegistryError::io("Failed to resolve registry root", &self.root, e))?;
        match real_path(&resolved) {
            Ok(real) if real.starts_with(&real_root) => Ok(resolved),
            _ => Err(RegistryError::PathEscapesRoot { uri: uri.to_string() }),
        }
    }

    /// Public URLs are not available for this scheme; always fails.
    pub fn external_url(&self, _uri: &str) -> Result<String> {
        Err(RegistryError::NotPublic {
            scheme: self.name().to_string(),
        })
    }

    pub fn exists(&self, uri: &str) -> Result<bool> {
        Ok(self.resolve(uri)?.exists())
    }

    pub fn open(&self, uri: &str) -> Result<File> {
        let path = self.resolve(uri)?;
        File::open(&path).map_err(|e| RegistryError::io("Failed to open", path, e))
    }

    pub fn read(&self, uri: &str) -> Result<Vec<u8>> {
        let path = self.resolve(uri)?;
        fs::read(&path).map_err(|e| RegistryError::io("Failed to read", path, e))
    }

    pub fn read_to_string(&self, uri: &str) -> Result<String> {
        let path = self.resolve(uri)?;
        fs::read_to_string(&path).map_err(|e| RegistryError::io("Failed to read", path, e))
    }

    pub fn stat(&self, uri: &str) -> Result<Metadata> {
        let path = self.resolve(uri)?;
        fs::metadata(&path).map_err(|e| RegistryError::io("Failed to stat", path, e))
    }

    /// Write a file, creating parent directories inside the root as needed.
    pub fn write_uri(&self, uri: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.resolve(uri)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| RegistryError::io("Failed to create directory", parent, e))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| RegistryError::io("Failed to open for writing", &path, e))?;
        file.write_all(contents)
            .map_err(|e| RegistryError::io("Failed to write", &path, e))?;

        debug!("Wrote {} ({} bytes)", uri, contents.len());
        Ok(path)
    }

    /// List a directory under the scheme, sorted by name.
    ///
    /// A missing registry root lists as empty.
    pub fn list(&self, uri: &str) -> Result<Vec<RegistryEntry>> {
        let dir = self.resolve(uri)?;
        if !dir.exists() && dir == self.root {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir)
            .map_err(|e| RegistryError::io("Failed to read directory", &dir, e))?;
        let at_root = dir == self.root;
        let base = uri.trim_end_matches('/');

        let mut listed = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RegistryError::io("Failed to read directory", &dir, e))?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            let uri = if at_root {
                self.uri(&file_name)
            } else {
                format!("{}/{}", base, file_name)
            };
            listed.push(RegistryEntry {
                uri,
                is_dir: path.is_dir(),
                path,
            });
        }

        listed.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(listed)
    }
}

/// Canonicalize `path`, or its nearest existing ancestor when the path itself
/// does not exist yet. A dangling symlink is an error.
fn real_path(path: &Path) -> io::Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    while fs::symlink_metadata(existing).is_err() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let existing = if existing.as_os_str().is_empty() { Path::new(".") } else { existing };
    let mut real = fs::canonicalize(existing)?;
    for name in missing.into_iter().rev() {
        real.push(name);
    }
    Ok(real)
}

impl RegistryStorage for RegistryStream {
    fn write(&self, filename: &str, contents: &[u8]) -> Result<PathBuf> {
        self.write_uri(&self.uri(filename), contents)
    }
}
