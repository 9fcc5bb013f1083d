//! Namespaces as the cluster reports them.

use std::path::Path;

use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::ListParams,
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::source::ConfigFile;

/// Namespace names in the order the API returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceSet(Vec<String>);

impl NamespaceSet {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|ns| ns == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for NamespaceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Anything that can tell which namespaces exist.
#[allow(async_fn_in_trait)]
pub trait NamespaceLister {
    async fn list_namespaces(&self) -> Result<NamespaceSet>;
}

/// A fixed set lists itself.
impl NamespaceLister for NamespaceSet {
    async fn list_namespaces(&self) -> Result<NamespaceSet> {
        Ok(self.clone())
    }
}

/// Lists namespaces from a live cluster.
#[derive(Clone)]
pub struct KubeNamespaces {
    client: Client,
}

impl KubeNamespaces {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects using the current context of already loaded kubeconfig files.
    pub async fn from_files(files: &[ConfigFile]) -> Result<Self> {
        let kubeconfig = client_kubeconfig(files)?;
        let config =
            kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        debug!(cluster_url = %config.cluster_url, "connecting to cluster");
        let client = Client::try_from(config).map_err(Error::ClusterQuery)?;
        Ok(Self::new(client))
    }
}

/// Parses each file's text the way `Kubeconfig::read_from` would load it,
/// relative file references resolved against that file's directory, and
/// merges them in order.
fn client_kubeconfig(files: &[ConfigFile]) -> Result<Kubeconfig> {
    let mut merged: Option<Kubeconfig> = None;
    for file in files {
        let mut kubeconfig = Kubeconfig::from_yaml(&file.raw)?;
        if let Some(dir) = file.path.parent() {
            resolve_relative_paths(&mut kubeconfig, dir);
        }
        merged = Some(match merged {
            Some(merged) => merged.merge(kubeconfig)?,
            None => kubeconfig,
        });
    }
    Ok(merged.unwrap_or_default())
}

fn resolve_relative_paths(kubeconfig: &mut Kubeconfig, dir: &Path) {
    for cluster in kubeconfig.clusters.iter_mut().filter_map(|c| c.cluster.as_mut()) {
        make_absolute(&mut cluster.certificate_authority, dir);
    }
    for auth in kubeconfig
        .auth_infos
        .iter_mut()
        .filter_map(|a| a.auth_info.as_mut())
    {
        make_absolute(&mut auth.client_certificate, dir);
        make_absolute(&mut auth.client_key, dir);
        make_absolute(&mut auth.token_file, dir);
    }
}

fn make_absolute(path: &mut Option<String>, dir: &Path) {
    if let Some(p) = path {
        if !p.is_empty() && Path::new(p.as_str()).is_relative() {
            *p = dir.join(p.as_str()).to_string_lossy().into_owned();
        }
    }
}

impl NamespaceLister for KubeNamespaces {
    #[instrument(skip(self))]
    async fn list_namespaces(&self) -> Result<NamespaceSet> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces
            .list(&ListParams::default())
            .await
            .map_err(Error::ClusterQuery)?;
        debug!(count = list.items.len(), "listed namespaces");
        Ok(list.items.iter().map(ResourceExt::name_any).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::source::ConfigSource;
    use crate::test_utils::{namespace_list_json, MockService, FORBIDDEN_JSON, NAMESPACES_PATH};

    #[tokio::test]
    async fn lists_names_in_api_order() {
        let client = MockService::new()
            .on_get(
                NAMESPACES_PATH,
                200,
                &namespace_list_json(&["kube-system", "default", "apps"]),
            )
            .into_client();

        let set = KubeNamespaces::new(client).list_namespaces().await.unwrap();

        assert_eq!(set.iter().collect::<Vec<_>>(), ["kube-system", "default", "apps"]);
    }

    #[tokio::test]
    async fn api_failures_are_cluster_query_errors() {
        let client = MockService::new()
            .on_get(NAMESPACES_PATH, 403, FORBIDDEN_JSON)
            .into_client();

        let err = KubeNamespaces::new(client)
            .list_namespaces()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ClusterQuery(kube::Error::Api(ref resp)) if resp.code == 403));
        assert!(err.to_string().starts_with("failed to get namespaces"));
    }

    #[tokio::test]
    async fn fixed_set_lists_itself() {
        let set: NamespaceSet = ["a", "b"].into_iter().collect();

        assert_eq!(set.list_namespaces().await.unwrap(), set);
        assert!(set.contains("b"));
        assert!(!set.contains("B"));
    }

    #[tokio::test]
    async fn unusable_kubeconfig_fails_to_connect() {
        let file = ConfigFile::new("config", "current-context: nowhere\n".to_string()).unwrap();
        let result = KubeNamespaces::from_files(&[file]).await;

        assert!(matches!(result, Err(Error::ClusterConnect(_))));
    }

    const RELATIVE_PATHS: &str = r#"
clusters:
- name: dev
  cluster:
    server: https://127.0.0.1:6443
    certificate-authority: ca.crt
contexts:
- name: dev
  context:
    cluster: dev
    user: token-user
current-context: dev
users:
- name: token-user
  user:
    token: secret
- name: cert-user
  user:
    client-certificate: certs/client.crt
    client-key: /etc/keys/client.key
"#;

    #[tokio::test]
    async fn relative_paths_follow_their_kubeconfig() {
        let dir = tempfile::tempdir().unwrap();
        fs::copy(
            concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/ca.crt"),
            dir.path().join("ca.crt"),
        )
        .unwrap();
        let path = dir.path().join("config");
        fs::write(&path, RELATIVE_PATHS).unwrap();
        let files = ConfigSource::new(&path).read().unwrap();

        let kubeconfig = client_kubeconfig(&files).unwrap();

        let ca = kubeconfig.clusters[0].cluster.as_ref().unwrap();
        let expected_ca = dir.path().join("ca.crt");
        assert_eq!(ca.certificate_authority.as_deref(), expected_ca.to_str());
        let cert_user = kubeconfig.auth_infos[1].auth_info.as_ref().unwrap();
        let expected_cert = dir.path().join("certs/client.crt");
        assert_eq!(cert_user.client_certificate.as_deref(), expected_cert.to_str());
        assert_eq!(cert_user.client_key.as_deref(), Some("/etc/keys/client.key"));

        // The CA is loaded from disk here, wherever the test runs from.
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn files_merge_before_connecting() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home.yaml");
        let team = dir.path().join("team.yaml");
        fs::write(&home, "current-context: team\n").unwrap();
        fs::write(
            &team,
            "clusters:\n- name: team\n  cluster:\n    server: https://10.0.0.1:6443\ncontexts:\n- name: team\n  context:\n    cluster: team\n    user: team\ncurrent-context: other\nusers:\n- name: team\n  user:\n    token: secret\n",
        )
        .unwrap();
        let files = ConfigSource::chain([home, team]).read().unwrap();

        let kubeconfig = client_kubeconfig(&files).unwrap();
        assert_eq!(kubeconfig.current_context.as_deref(), Some("team"));

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .unwrap();
        assert_eq!(config.cluster_url.host(), Some("10.0.0.1"));
    }
}
