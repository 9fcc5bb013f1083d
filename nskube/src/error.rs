use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("either one or no arguments are allowed")]
    ArgumentCount { given: usize },

    #[error("unable to locate a kubeconfig, set KUBECONFIG or HOME")]
    NoConfigSource,

    #[error("failed to load kubeconfig {}: {source}", path.display())]
    ConfigLoad { path: PathBuf, source: io::Error },

    #[error("failed to connect to cluster: {0}")]
    ClusterConnect(#[from] kube::config::KubeconfigError),

    #[error("failed to get namespaces: {0}")]
    ClusterQuery(#[source] kube::Error),

    #[error("current context {0} not found anymore in the configuration")]
    MissingContext(String),

    #[error("can't change namespace, \"{0}\" does not exist")]
    NamespaceNotFound(String),

    #[error("failed to write kubeconfig {}: {source}", path.display())]
    ConfigPersist { path: PathBuf, source: io::Error },

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
