//! Editor configuration from postdoc.toml

use crate::html_serializer::SerializeOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Editor configuration from postdoc.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Output post-processing
    pub serializer: SerializerConfig,

    /// Image upload endpoint
    pub upload: UploadConfig,

    /// What the editing session belongs to
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Remove `data-slate-*` and `data-testid` attributes from output
    pub strip_data_attributes: bool,

    /// Class name prefixes kept in output; every other class is removed
    pub preserve_class_names: Vec<String>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        let options = SerializeOptions::default();
        Self {
            strip_data_attributes: options.strip_data_attributes,
            preserve_class_names: options.preserve_class_names,
        }
    }
}

impl SerializerConfig {
    pub fn to_options(&self) -> SerializeOptions {
        SerializeOptions {
            strip_data_attributes: self.strip_data_attributes,
            strip_class_names: true,
            preserve_class_names: self.preserve_class_names.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Endpoint images are posted to
    pub endpoint: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/upload".to_string(),
        }
    }
}

/// The post or snippet being edited
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Project the document is attached to
    pub project_id: Option<String>,

    /// URL name of the post or snippet
    pub url_name: Option<String>,

    /// Posts get the call-to-action embed; snippets do not
    pub is_post: bool,
}

impl EditorConfig {
    /// Load configuration from a postdoc.toml file
    ///
    /// # Parameters
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(EditorConfig)` - Loaded configuration, or defaults when the file does not exist
    /// * `Err(ConfigError)` - Error reading or parsing the configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("{} not found, using default configuration", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;
        toml::from_str(&content).map_err(ConfigError::ParseError)
    }

    /// Save configuration to a postdoc.toml file
    ///
    /// # Parameters
    /// * `path` - Path where the configuration file will be written
    ///
    /// # Returns
    /// * `Ok(())` - Successfully saved configuration
    /// * `Err(ConfigError)` - Error serializing or writing the configuration file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        fs::write(&path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }
}

/// Errors that can occur when loading or saving editor configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum ConfigError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();

        assert!(config.serializer.strip_data_attributes);
        assert_eq!(config.serializer.preserve_class_names, vec!["slate-".to_string()]);
        assert_eq!(config.upload.endpoint, "/api/upload");
        assert!(!config.session.is_post);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_content = r#"
[serializer]
preserve_class_names = ["slate-", "prose"]

[session]
project_id = "p-42"
url_name = "hello-world"
is_post = true
"#;

        let config: EditorConfig = toml::from_str(toml_content).unwrap();

        assert!(config.serializer.strip_data_attributes);
        assert_eq!(config.serializer.preserve_class_names.len(), 2);
        assert_eq!(config.upload.endpoint, "/api/upload");
        assert_eq!(config.session.project_id.as_deref(), Some("p-42"));
        assert!(config.session.is_post);
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = EditorConfig::default();
        config.upload.endpoint = "https://example.com/upload".to_string();
        config.session.url_name = Some("notes".to_string());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: EditorConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let config = EditorConfig::load("/nonexistent/postdoc.toml").unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postdoc.toml");
        fs::write(&path, "[serializer\n").unwrap();

        let result = EditorConfig::load(&path);

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postdoc.toml");
        let mut config = EditorConfig::default();
        config.session.project_id = Some("p-1".to_string());

        config.save(&path).unwrap();

        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }
}
