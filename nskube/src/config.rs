use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value as YamlValue};

use crate::error::{Error, Result};

// region: Context
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ContextSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<YamlValue>,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl ContextSpec {
    /// The namespace this context points at. An unset namespace is `""`,
    /// which the cluster treats as `default`.
    pub fn active_namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or_default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Context {
    pub name: String,
    #[serde(default)]
    pub context: ContextSpec,
    #[serde(flatten)]
    pub extra: Mapping,
}
// endregion

// region: Config
/// A kubeconfig file as written on disk.
///
/// Only contexts are interpreted. Clusters, users and any keys this model
/// doesn't know about are carried along untouched so that a rewrite only
/// changes what was explicitly mutated.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct KubeConfig {
    #[serde(rename = "apiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub clusters: Vec<YamlValue>,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub contexts: Vec<Context>,
    #[serde(default)]
    pub current_context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<YamlValue>,
    #[serde(default, deserialize_with = "nullable_seq")]
    pub users: Vec<YamlValue>,
    #[serde(flatten)]
    pub extra: Mapping,
}

// kubectl writes `contexts: null` for an empty list
fn nullable_seq<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn merge_named(into: &mut Vec<YamlValue>, next: &[YamlValue]) {
    for entry in next {
        let name = entry.get("name");
        if name.is_none() || !into.iter().any(|known| known.get("name") == name) {
            into.push(entry.clone());
        }
    }
}

// The emitter leaves these bare, but YAML 1.1 readers such as kubectl's
// take them as booleans. Strings are the only thing it emits plain on a
// single line, so a bare one in value position is always a string.
const YAML11_BOOLS: [&str; 4] = ["y", "Y", "n", "N"];

fn quote_yaml11_bools(yaml: &str) -> String {
    let mut out = String::with_capacity(yaml.len());
    for segment in yaml.split_inclusive('\n') {
        let (line, eol) = match segment.strip_suffix('\n') {
            Some(line) => (line, "\n"),
            None => (segment, ""),
        };
        match bare_bool(line) {
            Some((head, word)) => {
                out.push_str(head);
                out.push('"');
                out.push_str(word);
                out.push('"');
            }
            None => out.push_str(line),
        }
        out.push_str(eol);
    }
    out
}

fn bare_bool(line: &str) -> Option<(&str, &'static str)> {
    YAML11_BOOLS.iter().find_map(|&word| {
        let head = line.strip_suffix(word)?;
        let seq_item = head.ends_with("- ") && head.chars().all(|c| c == ' ' || c == '-');
        (head.ends_with(": ") || seq_item).then_some((head, word))
    })
}

impl KubeConfig {
    pub fn from_yaml(text: &str) -> std::result::Result<KubeConfig, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(KubeConfig::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self).map(|yaml| quote_yaml11_bools(&yaml))
    }

    /// Folds several files into one view the way kubectl merges
    /// `$KUBECONFIG`: the first file to set a value or define a name wins.
    pub fn merged<'a>(configs: impl IntoIterator<Item = &'a KubeConfig>) -> KubeConfig {
        configs
            .into_iter()
            .fold(KubeConfig::default(), |mut merged, next| {
                merged.merge(next);
                merged
            })
    }

    fn merge(&mut self, next: &KubeConfig) {
        if self.current_context.is_empty() {
            self.current_context = next.current_context.clone();
        }
        if self.api_version.is_none() {
            self.api_version = next.api_version.clone();
        }
        if self.kind.is_none() {
            self.kind = next.kind.clone();
        }
        if self.preferences.is_none() {
            self.preferences = next.preferences.clone();
        }
        for ctx in &next.contexts {
            if self.context(&ctx.name).is_none() {
                self.contexts.push(ctx.clone());
            }
        }
        merge_named(&mut self.clusters, &next.clusters);
        merge_named(&mut self.users, &next.users);
        for (key, value) in &next.extra {
            if !self.extra.contains_key(key) {
                self.extra.insert(key.clone(), value.clone());
            }
        }
    }

    /// Looks a context up by name. The first entry wins when a name repeats.
    pub fn context(&self, name: &str) -> Option<&ContextSpec> {
        self.contexts
            .iter()
            .find(|ctx| ctx.name == name)
            .map(|ctx| &ctx.context)
    }

    pub fn context_mut(&mut self, name: &str) -> Option<&mut ContextSpec> {
        self.contexts
            .iter_mut()
            .find(|ctx| ctx.name == name)
            .map(|ctx| &mut ctx.context)
    }

    pub fn current_context(&self) -> Result<&ContextSpec> {
        self.context(&self.current_context)
            .ok_or_else(|| Error::MissingContext(self.current_context.clone()))
    }

    pub fn current_context_mut(&mut self) -> Result<&mut ContextSpec> {
        let name = self.current_context.clone();
        self.context_mut(&name).ok_or(Error::MissingContext(name))
    }
}
// endregion
