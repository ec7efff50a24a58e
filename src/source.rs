//! Content sources.
//!
//! Everything the pipeline reads goes through [`ContentSource`]: month
//! discovery, media probing, manifest and payload fetches. Paths are
//! `/`-separated and relative to the site root (`media/03.2025/sections.json`).
//!
//! Two implementations:
//!
//! - [`DirSource`] reads a site checked out on disk.
//! - [`HttpSource`] reads a deployed site through a blocking `reqwest` client.
//!
//! `exists` is a probe and never fails: any error means "absent". `fetch`
//! reports why a read failed so callers can decide how loud to be.

use crate::config::{ProbeMethod, ProbingConfig};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Url;
use reqwest::blocking::Client;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("not valid UTF-8: {0}")]
    Utf8(String),
}

/// Read access to a site's content tree.
pub trait ContentSource: Sync {
    /// Whether `path` resolves to a readable file.
    fn exists(&self, path: &str) -> bool;

    /// Raw bytes at `path`.
    fn fetch(&self, path: &str) -> Result<Vec<u8>, SourceError>;

    /// Absolute URL for `path` when pages should link to the source directly.
    ///
    /// Local sources return `None`; their media is copied into the output.
    fn public_url(&self, _path: &str) -> Option<String> {
        None
    }

    /// Directory backing this source, if any.
    fn local_root(&self) -> Option<&Path> {
        None
    }

    fn fetch_text(&self, path: &str) -> Result<String, SourceError> {
        let bytes = self.fetch(path)?;
        String::from_utf8(bytes).map_err(|_| SourceError::Utf8(path.to_string()))
    }

    /// Short human description used in logs and CLI output.
    fn describe(&self) -> String;
}

/// Join two source path segments with a single `/`.
pub fn join(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

/// Characters escaped inside one path segment (WHATWG path-segment set plus `%`).
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode each `/`-separated segment of a source path.
///
/// The result is a relative URL reference that names exactly `path`, so
/// folders like `50% off #1` survive as `50%25%20off%20%231`.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// Directory source
// ============================================================================

/// A site on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a relative source path to a filesystem path under the root.
    ///
    /// Absolute paths and `..` components are rejected.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, SourceError> {
        let rel = Path::new(path);
        let mut resolved = self.root.clone();
        for component in rel.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(SourceError::InvalidPath(path.to_string())),
            }
        }
        Ok(resolved)
    }
}

impl ContentSource for DirSource {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        let resolved = self.resolve(path)?;
        fs::read(&resolved).map_err(|source| SourceError::Io {
            path: path.to_string(),
            source,
        })
    }

    fn local_root(&self) -> Option<&Path> {
        Some(&self.root)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

// ============================================================================
// HTTP source
// ============================================================================

/// A deployed site reached over HTTP.
pub struct HttpSource {
    base: Url,
    client: Client,
    method: ProbeMethod,
}

impl HttpSource {
    pub fn new(base: &str, probing: &ProbingConfig) -> Result<Self, SourceError> {
        // Url::join replaces the last segment unless the base ends in '/'
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base =
            Url::parse(&normalized).map_err(|_| SourceError::InvalidPath(base.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(probing.timeout_secs))
            .build()?;
        Ok(Self {
            base,
            client,
            method: probing.method,
        })
    }

    fn url(&self, path: &str) -> Result<Url, SourceError> {
        if path.split('/').any(|seg| seg == "..") {
            return Err(SourceError::InvalidPath(path.to_string()));
        }
        self.base
            .join(&encode_path(path.trim_start_matches('/')))
            .map_err(|_| SourceError::InvalidPath(path.to_string()))
    }
}

impl ContentSource for HttpSource {
    fn exists(&self, path: &str) -> bool {
        let Ok(url) = self.url(path) else {
            return false;
        };
        let request = match self.method {
            ProbeMethod::Head => self.client.head(url),
            ProbeMethod::Get => self.client.get(url),
        };
        match request.send() {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                log::debug!("probe {path} failed: {e}");
                false
            }
        }
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        let url = self.url(path)?;
        let resp = self.client.get(url.clone()).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp.bytes()?.to_vec())
    }

    fn public_url(&self, path: &str) -> Option<String> {
        self.url(path).ok().map(|u| u.to_string())
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}
