pub mod cluster;
pub mod config;
pub mod controller;
pub mod error;
pub mod loader;
pub mod request;
pub mod source;

#[cfg(test)]
mod test_utils;

use std::path::{Path, PathBuf};

pub use cluster::{KubeNamespaces, NamespaceLister, NamespaceSet};
pub use config::{Context, ContextSpec, KubeConfig};
pub use controller::{NamespaceController, NamespaceLine, SwitchOutcome};
pub use error::{Error, Result};
pub use loader::{ConfigLoader, Loaded};
pub use request::InvocationRequest;
pub use source::{ConfigFile, ConfigSource};

pub fn kube_dir() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".kube"))
}
