use tracing::{debug, info, warn};

use crate::cluster::{KubeNamespaces, NamespaceLister, NamespaceSet};
use crate::config::KubeConfig;
use crate::error::Result;
use crate::source::{ConfigFile, ConfigSource};

/// Everything a run works on, fetched up front.
#[derive(Debug, Clone)]
pub struct Loaded {
    /// The files as read, kept so a change lands in the one that owns it.
    pub files: Vec<ConfigFile>,
    /// All files merged into the view kubectl would see.
    pub config: KubeConfig,
    pub namespaces: NamespaceSet,
}

pub struct ConfigLoader {
    source: ConfigSource,
}

impl ConfigLoader {
    pub fn new(source: ConfigSource) -> Self {
        Self { source }
    }

    /// Reads the kubeconfig and lists namespaces from the cluster it points at.
    pub async fn load(&self) -> Result<Loaded> {
        let (files, config) = self.read()?;
        let lister = KubeNamespaces::from_files(&files).await?;
        self.finish(files, config, &lister).await
    }

    /// Like [`ConfigLoader::load`], with the namespaces coming from `lister`.
    pub async fn load_with<L: NamespaceLister>(&self, lister: &L) -> Result<Loaded> {
        let (files, config) = self.read()?;
        self.finish(files, config, lister).await
    }

    fn read(&self) -> Result<(Vec<ConfigFile>, KubeConfig)> {
        let files = self.source.read()?;
        let config = KubeConfig::merged(files.iter().map(|file| &file.config));
        // No point in asking a cluster about a context that doesn't exist.
        config.current_context()?;
        debug!(
            context = %config.current_context,
            files = files.len(),
            "kubeconfig loaded"
        );
        Ok((files, config))
    }

    async fn finish<L: NamespaceLister>(
        &self,
        files: Vec<ConfigFile>,
        config: KubeConfig,
        lister: &L,
    ) -> Result<Loaded> {
        let namespaces = lister.list_namespaces().await?;
        if namespaces.is_empty() {
            warn!("cluster reported no namespaces");
        }
        info!(count = namespaces.len(), "namespaces fetched");
        Ok(Loaded {
            files,
            config,
            namespaces,
        })
    }
}
