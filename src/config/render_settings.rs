use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::config::context_file;
use crate::template::{Context, Namespace, Value};

/// Settings for one render, read from a YAML file and/or the command line.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct RenderSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtins: Option<bool>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub variables: HashMap<String, serde_yaml::Value>,
}

impl RenderSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Layer `overrides` on top of `self`: every value set in `overrides` wins,
    /// and variables are combined key by key.
    pub fn merge(mut self, overrides: RenderSettings) -> RenderSettings {
        self.variables.extend(overrides.variables);
        RenderSettings {
            template: overrides.template.or(self.template),
            context: overrides.context.or(self.context),
            output: overrides.output.or(self.output),
            builtins: overrides.builtins.or(self.builtins),
            variables: self.variables,
        }
    }

    pub fn use_builtins(&self) -> bool {
        self.builtins.unwrap_or(true)
    }

    pub fn namespace(&self) -> Namespace {
        if self.use_builtins() {
            Namespace::builtin()
        } else {
            Namespace::new()
        }
    }

    /// The render context: the context file (if any) with `variables` set on top.
    pub fn build_context(&self) -> Result<Context> {
        let frame = match &self.context {
            Some(path) => context_file::load(path)?,
            None => Default::default(),
        };
        let mut context = Context::from_map(frame);
        for (key, value) in &self.variables {
            context.set(key.as_str(), Value::from(value.clone()));
        }
        Ok(context)
    }
}

/// Parse a `KEY=VALUE` definition. The value is read as a YAML scalar, so
/// `count=3` binds an integer and `name=Kyle` a string.
pub fn parse_define(define: &str) -> Result<(String, serde_yaml::Value)> {
    let Some((key, value)) = define.split_once('=') else {
        bail!("Invalid definition '{}': expected KEY=VALUE", define);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Invalid definition '{}': key must not be empty", define);
    }

    let value = match serde_yaml::from_str::<serde_yaml::Value>(value) {
        Ok(parsed @ (serde_yaml::Value::Bool(_) | serde_yaml::Value::Number(_))) => parsed,
        _ => serde_yaml::Value::String(value.to_string()),
    };
    Ok((key.to_string(), value))
}
