use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level project configuration loaded from `.xso.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct XsoConfig {
    pub input: String,
    pub output: String,
    /// Schema identifier, first part of every registry name (`nfe`).
    pub schema: String,
    /// Schema version, second part of every registry name (`40`).
    pub version: String,
    /// Extra skip regexes, appended to the XML-DSig defaults.
    pub skip: Vec<String>,
    pub numeric: NumericConfig,
    pub model: ModelConfig,
    pub field_naming: FieldNamingConfig,
    pub labels: LabelConfig,
    pub merge: MergeConfig,
    pub format: FormatConfig,
}

impl Default for XsoConfig {
    fn default() -> Self {
        Self {
            input: "classes.yaml".to_string(),
            output: "generated".to_string(),
            schema: "spec".to_string(),
            version: "10".to_string(),
            skip: Vec::new(),
            numeric: NumericConfig::default(),
            model: ModelConfig::default(),
            field_naming: FieldNamingConfig::default(),
            labels: LabelConfig::default(),
            merge: MergeConfig::default(),
            format: FormatConfig::default(),
        }
    }
}

impl XsoConfig {
    /// Mixin model inherited by every generated model.
    pub fn inherit_model(&self) -> String {
        self.model
            .inherit
            .clone()
            .unwrap_or_else(|| format!("spec.mixin.{}", self.schema))
    }

    /// Prefix applied to generated field names.
    pub fn field_prefix(&self) -> String {
        self.field_naming
            .prefix
            .clone()
            .unwrap_or_else(|| format!("{}{}_", self.schema, self.version))
    }
}

/// Monetary vs Float detection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NumericConfig {
    /// Decimal digit count that denotes an amount of money.
    pub monetary_digits: u32,
    /// Numeric xsd type convention: a plain prefix (`TDec`) or a prefix
    /// followed by the integer and decimal digit slices (`TDec_[5:7.7:9]`).
    pub num_type: String,
    /// Xsd type prefix that always maps to a Monetary field.
    pub monetary_type: Option<String>,
    pub currency_field: String,
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            monetary_digits: 2,
            num_type: "TDec_[5:7.7:9]".to_string(),
            monetary_type: None,
            currency_field: "brl_currency_id".to_string(),
        }
    }
}

/// Base classes of the generated models.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub python_inherit: String,
    /// Defaults to `spec.mixin.{schema}`.
    pub inherit: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            python_inherit: "models.AbstractModel".to_string(),
            inherit: None,
        }
    }
}

/// How field names are derived from attribute names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldNamingStrategy {
    /// Keep the attribute name untouched.
    NoPrefixNoSafeName,
    /// Prefix, then make the result a safe Python identifier.
    PrefixSafeName,
    /// Prefix, keep the attribute name as is.
    #[default]
    PrefixRawName,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FieldNamingConfig {
    pub strategy: FieldNamingStrategy,
    /// Defaults to `{schema}{version}_`.
    pub prefix: Option<String>,
}

/// Stopword language used when shortening labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelLanguage {
    #[default]
    Portuguese,
    English,
}

/// Field label extraction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub language: LabelLanguage,
    pub stopwords: Vec<String>,
    pub useless_starts: Vec<String>,
    /// Punctuation cuts stop once the label is this short.
    pub min_len: usize,
    /// Labels longer than this are cut on stopwords or replaced.
    pub max_len: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            language: LabelLanguage::Portuguese,
            stopwords: Vec::new(),
            useless_starts: vec![
                "Informar o ".to_string(),
                "Informar a ".to_string(),
                "Preencher com ".to_string(),
            ],
            min_len: 36,
            max_len: 40,
        }
    }
}

/// How the `max_occurs` of merged duplicate attributes is combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxOccursMerge {
    /// Keep the smallest bound: choice alternatives stay scalar.
    #[default]
    Minimum,
    /// Add the bounds up, like a plain sequence would.
    Sum,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub max_occurs: MaxOccursMerge,
    /// Forces [`MaxOccursMerge::Sum`].
    pub disable_choice_workaround: bool,
}

impl MergeConfig {
    pub fn effective(&self) -> MaxOccursMerge {
        if self.disable_choice_workaround {
            MaxOccursMerge::Sum
        } else {
            self.max_occurs
        }
    }
}

/// Post-generation formatting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub enabled: bool,
    pub command: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "ruff".to_string(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".xso.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<XsoConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let config: XsoConfig = serde_yaml_ng::from_str(&content).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# xso configuration
input: classes.yaml     # class-model bundle exported from the XSD parser
output: generated
schema: nfe
version: "40"

skip: []                # extra class/field regexes, e.g. "^TNFe.infNFe.autXML$"

numeric:
  monetary_digits: 2
  num_type: "TDec_[5:7.7:9]"    # prefix[int_start:int_stop.dec_start:dec_stop]
  # monetary_type: TDec_1302     # xsd type prefix always mapped to Monetary
  currency_field: brl_currency_id

model:
  python_inherit: models.AbstractModel
  # inherit: spec.mixin.nfe

field_naming:
  strategy: prefix_raw_name     # no_prefix_no_safe_name | prefix_safe_name | prefix_raw_name
  # prefix: nfe40_

labels:
  language: portuguese          # portuguese | english
  stopwords: []
  min_len: 36
  max_len: 40

merge:
  max_occurs: minimum           # minimum | sum
  disable_choice_workaround: false

format:
  enabled: true
  command: ruff
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = XsoConfig::default();
        assert_eq!(config.schema, "spec");
        assert_eq!(config.inherit_model(), "spec.mixin.spec");
        assert_eq!(config.field_prefix(), "spec10_");
        assert_eq!(config.numeric.monetary_digits, 2);
        assert_eq!(config.field_naming.strategy, FieldNamingStrategy::PrefixRawName);
        assert_eq!(config.merge.effective(), MaxOccursMerge::Minimum);
        assert!(config.format.enabled);
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
schema: nfe
version: "40"
skip: ["^TNFe.infNFe.autXML$"]
numeric:
  monetary_type: TDec_1302
field_naming:
  strategy: prefix_safe_name
  prefix: nfe_
model:
  inherit: spec.mixin.nfe40
merge:
  max_occurs: minimum
  disable_choice_workaround: true
format:
  enabled: false
"#;
        let config: XsoConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.schema, "nfe");
        assert_eq!(config.version, "40");
        assert_eq!(config.skip.len(), 1);
        assert_eq!(config.numeric.monetary_type.as_deref(), Some("TDec_1302"));
        assert_eq!(config.numeric.num_type, "TDec_[5:7.7:9]");
        assert_eq!(config.field_prefix(), "nfe_");
        assert_eq!(config.inherit_model(), "spec.mixin.nfe40");
        assert_eq!(config.merge.effective(), MaxOccursMerge::Sum);
        assert!(!config.format.enabled);
    }

    #[test]
    fn test_default_config_content_parses() {
        let config: XsoConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.schema, "nfe");
        assert_eq!(config.field_prefix(), "nfe40_");
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(loaded.is_none());
    }
}
