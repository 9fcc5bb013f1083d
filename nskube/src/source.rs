use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::KubeConfig;
use crate::error::{Error, Result};
use crate::kube_dir;

pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// One kubeconfig file as read from disk, raw text kept alongside so the
/// cluster client can be built without touching the file again.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub config: KubeConfig,
    pub raw: String,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>, raw: String) -> Result<Self> {
        let path = path.into();
        match KubeConfig::from_yaml(&raw) {
            Ok(config) => Ok(Self { path, config, raw }),
            Err(e) => Err(Error::ConfigLoad {
                path,
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            }),
        }
    }

    /// Rewrites the whole file. Serialization happens before the file is
    /// opened, so a config that can't be encoded never truncates it.
    pub fn persist(&self) -> Result<()> {
        let text = self.config.to_yaml().map_err(|e| Error::ConfigPersist {
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        fs::write(&self.path, text).map_err(|source| Error::ConfigPersist {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "kubeconfig written");
        Ok(())
    }
}

/// Where the kubeconfig lives: a single file, or the `$KUBECONFIG` list
/// whose files are merged in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    paths: Vec<PathBuf>,
    skip_missing: bool,
}

impl ConfigSource {
    /// A single file that has to exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            skip_missing: false,
        }
    }

    /// A list of files as `$KUBECONFIG` holds them. Files that don't exist
    /// are skipped, as kubectl does.
    pub fn chain(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::new();
        for path in paths {
            if !path.as_os_str().is_empty() && !unique.contains(&path) {
                unique.push(path);
            }
        }
        Self {
            paths: unique,
            skip_missing: true,
        }
    }

    /// An explicit path, then every entry of `$KUBECONFIG`, then
    /// `~/.kube/config`.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        let env = std::env::var_os(KUBECONFIG_ENV);
        Self::resolve_from(explicit, env.as_deref(), kube_dir())
    }

    fn resolve_from(
        explicit: Option<PathBuf>,
        env: Option<&OsStr>,
        kube_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let chain = env.map(|paths| Self::chain(std::env::split_paths(paths)));
        let source = match (explicit, chain) {
            (Some(path), _) => Self::new(path),
            (None, Some(chain)) if !chain.paths.is_empty() => chain,
            _ => Self::new(kube_dir.ok_or(Error::NoConfigSource)?.join("config")),
        };
        debug!(paths = ?source.paths, "using kubeconfig");
        Ok(source)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Reads every file once, in order.
    pub fn read(&self) -> Result<Vec<ConfigFile>> {
        let mut files = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            match fs::read_to_string(path) {
                Ok(raw) => files.push(ConfigFile::new(path, raw)?),
                Err(e) if self.skip_missing && e.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "kubeconfig not found, skipping");
                }
                Err(source) => return Err(load_error(path, source)),
            }
        }
        Ok(files)
    }
}

fn load_error(path: &Path, source: io::Error) -> Error {
    Error::ConfigLoad {
        path: path.to_path_buf(),
        source,
    }
}
