//! Writer configuration loaded from a TOML file.
//!
//! The file is optional: a missing or empty file yields `Config::default()`.
//! Unknown keys are accepted and logged as warnings since they are usually
//! typos.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use thiserror::Error;

use crate::model::Attribute;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

/// Output document format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    #[default]
    Rss,
    Atom,
}

/// Settings shared by every feed generated in one run. Any key may be left out.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub format: FeedFormat,

    /// Write text that needs escaping as CDATA sections instead.
    pub use_cdata: bool,

    /// Extension namespaces declared on the root element, prefix → URI.
    pub namespaces: BTreeMap<String, String>,

    pub generator: Option<String>,

    /// Channel language tag (RSS only).
    pub language: Option<String>,

    /// RSS `<ttl>` in minutes. 0 = omitted.
    pub ttl_minutes: u64,
}

const KNOWN_KEYS: &[&str] = &[
    "format",
    "use_cdata",
    "namespaces",
    "generator",
    "language",
    "ttl_minutes",
];

impl Config {
    const SIZE_LIMIT: u64 = 1 << 20;

    /// Reads `path`, falling back to defaults when the file is absent or blank.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(text) = read_capped(path, Self::SIZE_LIMIT)? else {
            tracing::debug!(path = %path.display(), "Config not found");
            return Ok(Self::default());
        };
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let table: toml::Table = text.parse()?;
        for key in table.keys().filter(|k| !KNOWN_KEYS.contains(&k.as_str())) {
            tracing::warn!(key = %key, path = %path.display(), "Ignoring unrecognized config key");
        }

        let config: Config = toml::Value::Table(table).try_into()?;
        tracing::info!(path = %path.display(), format = ?config.format, "Config loaded");
        Ok(config)
    }

    /// `xmlns:prefix` declarations for the configured namespaces, in prefix
    /// order. These are written on the root element and primed into the
    /// formatter.
    pub fn known_attributes(&self) -> Vec<Attribute> {
        self.namespaces
            .iter()
            .map(|(prefix, uri)| Attribute::new(format!("xmlns:{prefix}"), uri.clone()))
            .collect()
    }
}

/// File contents, or `None` if there is no file. Reads at most `limit + 1`
/// bytes.
fn read_capped(path: &Path, limit: u64) -> Result<Option<String>, ConfigError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut text = String::new();
    file.take(limit + 1).read_to_string(&mut text)?;
    if text.len() as u64 > limit {
        return Err(ConfigError::TooLarge { limit });
    }
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Writes `text` to `config.toml` in a fresh temp directory named after `case`.
    fn config_file(case: &str, text: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("syndic_config_{case}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_absent_file_gives_defaults() {
        let config = Config::load(Path::new("/tmp/syndic_no_such_dir/config.toml")).unwrap();
        assert_eq!(config.format, FeedFormat::Rss);
        assert!(!config.use_cdata);
        assert!(config.namespaces.is_empty());
        assert!(config.generator.is_none());
        assert_eq!(config.ttl_minutes, 0);
    }

    #[test]
    fn test_blank_file_gives_defaults() {
        let path = config_file("blank", "  \n");
        assert_eq!(Config::load(&path).unwrap().format, FeedFormat::Rss);
        cleanup(&path);
    }

    #[test]
    fn test_single_key() {
        let path = config_file("single", "format = \"atom\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.format, FeedFormat::Atom);
        assert!(!config.use_cdata);
        cleanup(&path);
    }

    #[test]
    fn test_namespaces_become_known_attributes() {
        let path = config_file(
            "namespaces",
            r#"
use_cdata = true
generator = "syndic"
language = "en-US"
ttl_minutes = 60

[namespaces]
media = "http://search.yahoo.com/mrss/"
atom = "http://www.w3.org/2005/Atom"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert!(config.use_cdata);
        assert_eq!(config.generator.as_deref(), Some("syndic"));
        assert_eq!(config.language.as_deref(), Some("en-US"));
        assert_eq!(config.ttl_minutes, 60);

        let attributes = config.known_attributes();
        let names: Vec<&str> = attributes.iter().map(|a| a.name.as_ref()).collect();
        assert_eq!(names, vec!["xmlns:atom", "xmlns:media"]);
        assert_eq!(attributes[0].value, "http://www.w3.org/2005/Atom");
        cleanup(&path);
    }

    #[test]
    fn test_misspelled_key_ignored() {
        let path = config_file("misspelled", "formatt = \"atom\"\nuse_cdata = true\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.format, FeedFormat::Rss);
        assert!(config.use_cdata);
        cleanup(&path);
    }

    #[test]
    fn test_bad_values_rejected() {
        for (case, text) in [("no_value", "format = \n"), ("bad_format", "format = \"json\"\n")] {
            let path = config_file(case, text);
            assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))), "{case}");
            cleanup(&path);
        }
    }

    #[test]
    fn test_size_limit() {
        let limit = Config::SIZE_LIMIT as usize;
        let path = config_file("at_limit", &"#".repeat(limit));
        assert!(Config::load(&path).is_ok());
        cleanup(&path);

        let path = config_file("over_limit", &"#".repeat(limit + 1));
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::TooLarge { limit: 1_048_576 })
        ));
        cleanup(&path);
    }
}
