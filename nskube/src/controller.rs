use std::io::Write;

use console::style;
use tracing::{debug, info};

use crate::cluster::NamespaceSet;
use crate::config::KubeConfig;
use crate::error::{Error, Result};
use crate::loader::Loaded;
use crate::request::InvocationRequest;
use crate::source::ConfigFile;

/// One row of the namespace listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceLine<'a> {
    pub name: &'a str,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The context already pointed at the namespace; nothing was written.
    Unchanged,
    Switched,
}

pub struct NamespaceController {
    files: Vec<ConfigFile>,
    config: KubeConfig,
    namespaces: NamespaceSet,
}

impl NamespaceController {
    pub fn new(loaded: Loaded) -> Self {
        Self {
            files: loaded.files,
            config: loaded.config,
            namespaces: loaded.namespaces,
        }
    }

    pub fn config(&self) -> &KubeConfig {
        &self.config
    }

    /// Lists namespaces when no target was given, switches otherwise.
    /// `colored` decides whether the active namespace gets highlighted.
    pub fn run(
        &mut self,
        request: &InvocationRequest,
        out: &mut impl Write,
        colored: bool,
    ) -> Result<()> {
        match request.target() {
            Some(target) => self.switch(target, out).map(|_| ()),
            None => self.display(out, colored),
        }
    }

    /// Namespaces in API order, the first one equal to the current
    /// context's namespace marked active.
    pub fn lines(&self) -> Result<impl Iterator<Item = NamespaceLine<'_>>> {
        let current = self.config.current_context()?.active_namespace();
        let mut seen = false;
        Ok(self.namespaces.iter().map(move |name| {
            let active = !seen && name == current;
            seen |= active;
            NamespaceLine { name, active }
        }))
    }

    pub fn display(&self, out: &mut impl Write, colored: bool) -> Result<()> {
        for line in self.lines()? {
            if line.active {
                writeln!(out, "{}", style(line.name).red().force_styling(colored))?;
            } else {
                writeln!(out, "{}", line.name)?;
            }
        }
        Ok(())
    }

    pub fn switch(&mut self, target: &str, out: &mut impl Write) -> Result<SwitchOutcome> {
        let current = self.config.current_context()?.active_namespace();
        if current == target {
            debug!(namespace = target, "namespace already active");
            return Ok(SwitchOutcome::Unchanged);
        }

        if !self.namespaces.contains(target) {
            return Err(Error::NamespaceNotFound(target.to_string()));
        }

        self.config.current_context_mut()?.namespace = Some(target.to_string());

        // Only the first file defining the context is rewritten.
        let name = &self.config.current_context;
        let owner = self
            .files
            .iter()
            .position(|file| file.config.context(name).is_some())
            .ok_or_else(|| Error::MissingContext(name.clone()))?;
        let file = &mut self.files[owner];
        if let Some(context) = file.config.context_mut(name) {
            context.namespace = Some(target.to_string());
        }
        file.persist()?;
        info!(
            context = %name,
            namespace = target,
            path = %file.path.display(),
            "namespace switched"
        );

        writeln!(out, "namespace set to \"{target}\"")?;
        Ok(SwitchOutcome::Switched)
    }
}
