//! Configuration file formats.

use std::path::Path;

/// Declared format of a configuration file.
///
/// Only YAML and JSON have codecs; TOML and INI are recognised so that sources
/// can carry an accurate tag, but loading them goes through the JSON/YAML fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Yaml,
    Json,
    Toml,
    Ini,
}

impl Format {
    /// Parse an explicit format name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            "ini" => Some(Format::Ini),
            _ => None,
        }
    }

    /// Declared format for a path, by lower-cased extension. Unknown or missing
    /// extensions are declared YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match extension_of(path.as_ref()).as_deref() {
            Some("yaml") | Some("yml") => Format::Yaml,
            Some("json") => Format::Json,
            Some("toml") => Format::Toml,
            Some("ini") => Format::Ini,
            _ => Format::Yaml,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Toml => "toml",
            Format::Ini => "ini",
        }
    }

    /// Whether a codec exists for this format.
    pub fn is_supported(&self) -> bool {
        matches!(self, Format::Yaml | Format::Json)
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lower-cased extension without the leading dot.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_extension() {
        assert_eq!(Format::from_path("a/config.yaml"), Format::Yaml);
        assert_eq!(Format::from_path("config.YML"), Format::Yaml);
        assert_eq!(Format::from_path("config.Json"), Format::Json);
        assert_eq!(Format::from_path("config.toml"), Format::Toml);
        assert_eq!(Format::from_path("config.INI"), Format::Ini);
    }

    #[test]
    fn test_unknown_extension_declares_yaml() {
        assert_eq!(Format::from_path("config"), Format::Yaml);
        assert_eq!(Format::from_path("config.conf"), Format::Yaml);
        assert_eq!(Format::from_path(".buildcfg"), Format::Yaml);
    }

    #[test]
    fn test_parse_name() {
        assert_eq!(Format::parse("YAML"), Some(Format::Yaml));
        assert_eq!(Format::parse("yml"), Some(Format::Yaml));
        assert_eq!(Format::parse("json"), Some(Format::Json));
        assert_eq!(Format::parse("xml"), None);
    }

    #[test]
    fn test_supported() {
        assert!(Format::Yaml.is_supported());
        assert!(Format::Json.is_supported());
        assert!(!Format::Toml.is_supported());
        assert!(!Format::Ini.is_supported());
    }
}
