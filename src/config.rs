//! Site configuration.
//!
//! Values come from built-in defaults, optionally overridden by a YAML file
//! (`--config`), then by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_EMERGENCY_NUMBER: &str = "105";
pub const DEFAULT_VIDEO_URL: &str = "https://www.youtube.com/embed/iqyubMcvK-w";
pub const DEFAULT_MORE_INFO_URL: &str = "https://nema.gov.mn/uridchilan-sergiileh";
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3333;
pub const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yml::Error,
    },
    #[error("invalid emergency number {0:?}: expected digits, optionally prefixed with '+'")]
    EmergencyNumber(String),
    #[error("invalid {field} {value:?}: expected an https:// URL")]
    Url { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub emergency_number: String,
    pub video_url: String,
    pub more_info_url: String,
    pub static_dir: PathBuf,
    pub bind: String,
    pub port: u16,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            emergency_number: DEFAULT_EMERGENCY_NUMBER.to_owned(),
            video_url: DEFAULT_VIDEO_URL.to_owned(),
            more_info_url: DEFAULT_MORE_INFO_URL.to_owned(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            bind: DEFAULT_BIND.to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
}

impl SiteConfig {
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load defaults, then the YAML file at `path` if given, then `overrides`,
    /// and validate the result.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => {
                let text = fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                Self::from_yaml(&text, p)?
            }
            None => Self::default(),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(dir) = overrides.static_dir {
            self.static_dir = dir;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let digits = self
            .emergency_number
            .strip_prefix('+')
            .unwrap_or(&self.emergency_number);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::EmergencyNumber(self.emergency_number.clone()));
        }
        for (field, value) in [
            ("video_url", &self.video_url),
            ("more_info_url", &self.more_info_url),
        ] {
            if !value.starts_with("https://") {
                return Err(ConfigError::Url {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SiteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.emergency_number, "105");
        assert_eq!(config.port, 3333);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config =
            SiteConfig::from_yaml("emergency_number: \"103\"\n", Path::new("site.yml")).unwrap();
        assert_eq!(config.emergency_number, "103");
        assert_eq!(config.video_url, DEFAULT_VIDEO_URL);
        assert_eq!(config.bind, DEFAULT_BIND);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = SiteConfig::from_yaml("colour: teal\n", Path::new("site.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut config = SiteConfig::from_yaml("port: 4000\n", Path::new("site.yml")).unwrap();
        config.apply(Overrides {
            port: Some(5000),
            ..Overrides::default()
        });
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn bad_number_rejected() {
        for bad in ["", "+", "10 5", "105; rm", "abc"] {
            let config = SiteConfig {
                emergency_number: bad.to_owned(),
                ..SiteConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::EmergencyNumber(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn international_number_accepted() {
        let config = SiteConfig {
            emergency_number: "+97611105".to_owned(),
            ..SiteConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn plain_http_url_rejected() {
        let config = SiteConfig {
            video_url: "http://example.com/embed".to_owned(),
            ..SiteConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Url { field: "video_url", .. })
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = SiteConfig::load(
            Some(Path::new("/definitely/not/here/site.yml")),
            Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.yml");
        fs::write(&path, "emergency_number: \"103\"\nstatic_dir: assets\n").unwrap();
        let config = SiteConfig::load(Some(&path), Overrides::default()).unwrap();
        assert_eq!(config.emergency_number, "103");
        assert_eq!(config.static_dir, PathBuf::from("assets"));
    }
}
