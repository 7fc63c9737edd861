//! # Module Fetching
//!
//! Resolves module source identifiers and retrieves their bytes.
//!
//! A source is resolved in the context of the base URL that declared it:
//! absolute paths and `file://` URLs pass through, anything else resolves
//! relative to the base's parent directory. Transports are pluggable by
//! URL scheme through [`FetcherSet`]; the default set registers the
//! filesystem transport.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("No fetcher registered for scheme '{scheme}' in {url}")]
    UnsupportedScheme { scheme: String, url: String },
}

/// Returns the URL scheme, if any (`file://x` -> `file`)
fn scheme(url: &str) -> Option<&str> {
    url.split_once("://").map(|(scheme, _)| scheme)
}

/// Strips a `file://` prefix, leaving a filesystem path
fn file_path(url: &str) -> &str {
    url.strip_prefix("file://").unwrap_or(url)
}

/// Resolves a module source in the context of a base URL.
///
/// Absolute paths and URLs with an explicit scheme pass through unchanged;
/// relative sources resolve against the base's parent directory.
pub fn resolve_in_context(source: &str, base: &str) -> String {
    if scheme(source).is_some() || Path::new(source).is_absolute() {
        return source.to_string();
    }

    let base_dir = Path::new(file_path(base)).parent().unwrap_or_else(|| Path::new(""));
    base_dir.join(source).to_string_lossy().into_owned()
}

/// A transport: URL in, bytes out
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Filesystem transport for plain paths and `file://` URLs
#[derive(Debug, Default)]
pub struct FileFetcher;

impl Fetch for FileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url, "fetching");
        fs::read(file_path(url)).map_err(|source| FetchError::Io {
            url: url.to_string(),
            source,
        })
    }
}

/// Scheme-dispatching set of transports
pub struct FetcherSet {
    fetchers: HashMap<String, Box<dyn Fetch + Send + Sync>>,
}

impl Default for FetcherSet {
    /// Registers the filesystem transport for schemeless paths and `file://`
    fn default() -> Self {
        let mut set = Self {
            fetchers: HashMap::new(),
        };
        set.register("file", Box::new(FileFetcher));
        set
    }
}

impl FetcherSet {
    /// Installs a transport for a scheme, replacing any existing one
    pub fn register(&mut self, scheme: impl Into<String>, fetcher: Box<dyn Fetch + Send + Sync>) {
        self.fetchers.insert(scheme.into(), fetcher);
    }

    /// Fetches a URL via the transport registered for its scheme.
    /// Schemeless URLs are treated as filesystem paths.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let scheme = scheme(url).unwrap_or("file");
        let fetcher = self
            .fetchers
            .get(scheme)
            .ok_or_else(|| FetchError::UnsupportedScheme {
                scheme: scheme.to_string(),
                url: url.to_string(),
            })?;
        fetcher.fetch(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn absolute_sources_pass_through() {
        assert_eq!(
            resolve_in_context("/etc/settle/main.toml", "/srv/base.toml"),
            "/etc/settle/main.toml"
        );
    }

    #[test]
    fn scheme_sources_pass_through() {
        assert_eq!(
            resolve_in_context("file:///etc/main.toml", "/srv/base.toml"),
            "file:///etc/main.toml"
        );
    }

    #[test]
    fn relative_sources_resolve_against_base_dir() {
        assert_eq!(
            resolve_in_context("users.toml", "/srv/modules/main.toml"),
            "/srv/modules/users.toml"
        );
        assert_eq!(
            resolve_in_context("sub/inner.toml", "file:///srv/main.toml"),
            "/srv/sub/inner.toml"
        );
    }

    #[test]
    fn file_fetcher_reads_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.toml");
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(b"[task.a]\ncheck = \"true\"\n").unwrap();

        let bytes = FileFetcher.fetch(path.to_str().unwrap()).unwrap();
        assert!(bytes.starts_with(b"[task.a]"));
    }

    #[test]
    fn file_fetcher_strips_file_scheme() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.toml");
        fs::write(&path, "x = 1").unwrap();

        let url = format!("file://{}", path.display());
        assert!(FileFetcher.fetch(&url).is_ok());
    }

    #[test]
    fn missing_files_report_the_url() {
        let err = FileFetcher.fetch("/definitely/not/there.toml").unwrap_err();
        match err {
            FetchError::Io { url, .. } => assert_eq!(url, "/definitely/not/there.toml"),
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn fetcher_set_rejects_unknown_schemes() {
        let set = FetcherSet::default();
        assert!(matches!(
            set.fetch("https://example.com/main.toml"),
            Err(FetchError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn fetcher_set_dispatches_schemeless_paths_to_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.toml");
        fs::write(&path, "x = 1").unwrap();

        let set = FetcherSet::default();
        assert!(set.fetch(path.to_str().unwrap()).is_ok());
    }
}
