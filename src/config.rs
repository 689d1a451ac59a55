use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{
    fs::{read_to_string, write},
    path::PathBuf,
};

use crate::{
    error::LeafDocError,
    model::LeafKind,
    registry::{EntityRegistry, FieldShape},
};

/// Model configuration.
///
/// ```toml
/// root = "function"
///
/// [extra_fields]
/// function = ["since", "deprecated"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Kind of the root leaf built from an input file.
    #[serde(default = "default_root")]
    pub root: LeafKind,
    /// Additional known keys per kind name, resolved by identity passthrough.
    #[serde(default)]
    pub extra_fields: BTreeMap<String, Vec<String>>,
}

fn default_root() -> LeafKind {
    LeafKind::Function
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            root: default_root(),
            extra_fields: BTreeMap::new(),
        }
    }
}

impl ModelConfig {
    /// The built-in registry extended with [ModelConfig::extra_fields].
    pub fn registry(&self) -> Result<EntityRegistry, LeafDocError> {
        let mut registry = EntityRegistry::create();
        for (kind_name, fields) in self.extra_fields.iter() {
            let kind: LeafKind = kind_name.parse()?;
            let Some(schema) = registry.schema_mut(kind) else {
                return Err(LeafDocError::UnregisteredKind(kind));
            };
            for field in fields {
                if schema.position(field).is_some() {
                    tracing::debug!("[ModelConfig::registry] {kind}.{field} is already declared");
                    continue;
                }
                *schema = schema.clone().field(field, FieldShape::Scalar);
            }
        }
        Ok(registry)
    }
}

pub trait ModelConfigProvider {
    fn get_config(&self) -> Result<ModelConfig, LeafDocError>;
    fn set_config(&self, config: &ModelConfig) -> Result<(), LeafDocError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }
}

impl ModelConfigProvider for TomlConfigProvider {
    fn get_config(&self) -> Result<ModelConfig, LeafDocError> {
        tracing::debug!("Attempting to read model config from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using the default model config.");
            return Ok(ModelConfig::default());
        }
        let content = read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn set_config(&self, config: &ModelConfig) -> Result<(), LeafDocError> {
        tracing::debug!("Attempting to write model config to: {:?}", &self.path);
        let toml_string = toml::to_string(config)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_omitted() {
        let config: ModelConfig = toml::from_str("").unwrap();
        assert_eq!(config, ModelConfig::default());
        assert_eq!(config.root, LeafKind::Function);
    }

    #[test]
    fn test_extra_fields_extend_schema() {
        let config: ModelConfig = toml::from_str(
            r#"
root = "usage"

[extra_fields]
function = ["since", "name"]
"#,
        )
        .unwrap();
        assert_eq!(config.root, LeafKind::Usage);
        let registry = config.registry().unwrap();
        let schema = registry.schema(LeafKind::Function).unwrap();
        let keys: Vec<&str> = schema.known_keys().collect();
        assert_eq!(keys.last(), Some(&"since"));
        assert_eq!(keys.iter().filter(|k| **k == "name").count(), 1);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let mut config = ModelConfig::default();
        config
            .extra_fields
            .insert("class".to_string(), vec!["extends".to_string()]);
        assert!(matches!(
            config.registry(),
            Err(LeafDocError::Serialization(_))
        ));
    }
}
