//! KDL settings file.
//!
//! ```kdl
//! title "Weekly digest"
//! pretty true
//! ```

use std::path::{Path, PathBuf};

use kdl::KdlDocument;
use miette::{IntoDiagnostic, Result, WrapErr};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Document `<title>` for compiled output.
    pub title: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Config {
    pub fn parse(src: &str) -> Result<Self> {
        // kdl reports through an older miette, so carry the message across.
        let doc: KdlDocument = src
            .parse()
            .map_err(|err: kdl::KdlError| miette::miette!("invalid KDL: {err}"))?;
        let mut config = Config::default();

        if let Some(node) = doc.get("title") {
            let title = node
                .entries()
                .first()
                .and_then(|entry| entry.value().as_string())
                .ok_or_else(|| miette::miette!("`title` takes a single string"))?;
            config.title = Some(title.to_owned());
        }
        if let Some(node) = doc.get("pretty") {
            config.pretty = node
                .entries()
                .first()
                .and_then(|entry| entry.value().as_bool())
                .ok_or_else(|| miette::miette!("`pretty` takes true or false"))?;
        }
        Ok(config)
    }

    /// Load from `explicit`, which must exist, or from the default location
    /// if a file is there.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Config::default()),
            },
        };
        tracing::debug!(path = %path.display(), "loading config");
        let src = std::fs::read_to_string(&path)
            .into_diagnostic()
            .wrap_err_with(|| format!("reading config {}", path.display()))?;
        Self::parse(&src).wrap_err_with(|| format!("in config {}", path.display()))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("weaver-mail").join("config.kdl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_keys() {
        let config = Config::parse("title \"Digest\"\npretty true\n").unwrap();
        assert_eq!(
            config,
            Config {
                title: Some("Digest".into()),
                pretty: true,
            }
        );
    }

    #[test]
    fn test_empty_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(Config::parse("pretty \"yes\"").is_err());
        assert!(Config::parse("title 12").is_err());
        assert!(Config::parse("title \"unterminated").is_err());
    }

    #[test]
    fn test_syntax_errors_keep_the_message() {
        let err = Config::parse("title \"unterminated").unwrap_err();
        assert!(err.to_string().starts_with("invalid KDL: "));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/definitely/not/here.kdl"))).is_err());
    }
}
