//! Configuration primitives and loader for the markdown-articles service.
//!
//! Settings resolve with the precedence
//! override flag → working directory → built-in defaults.
//! Loading only checks that every layer is well-formed TOML with known keys.
//! Semantic checks run later through [`Config::validate`], scoped by
//! [`Usage`] so that offline parsing is not blocked by server settings.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".markdown-articles.toml";

pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/the-rileyj/Jetpacks/master/README.md";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub source: SourceSettings,
    pub server: ServerSettings,
    pub webhook: WebhookSettings,
    pub parser: ParserSettings,
    pub sources: ConfigSources,
}

/// Where the markdown document is fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSettings {
    pub url: String,
    pub timeout: Duration,
}

/// HTTP listener settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: String,
    pub route: String,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.bind.parse()
    }
}

/// Webhook authentication settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookSettings {
    pub secret_file: Option<PathBuf>,
    pub signature_header: String,
}

impl WebhookSettings {
    /// Reads the shared secret, trimming the trailing newline editors leave behind.
    ///
    /// Without a configured file the secret is empty.
    pub fn read_secret(&self) -> Result<String, ConfigError> {
        let Some(path) = &self.secret_file else {
            return Ok(String::new());
        };

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Secret {
            path: path.clone(),
            source,
        })?;
        Ok(contents.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Markers handed to the document parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParserSettings {
    pub title_prefix: String,
    pub divider: String,
    pub section_prefix: String,
    pub fence_marker: String,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn builtin(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to read webhook secret {path}: {source}")]
    Secret { path: PathBuf, source: io::Error },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let mut merged = PartialConfig::defaults();
        let mut layers = vec![ConfigSource::builtin(working_dir.clone())];

        let local_config_path = working_dir.join(CONFIG_FILE_NAME);
        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, &source)?);
            layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, &source)?);
            layers.push(source);
        }

        Ok(merged.finalize(ConfigSources {
            working_directory: working_dir,
            layers,
        }))
    }

    /// Checks the settings `usage` depends on. Run it after CLI overrides are
    /// applied; every failure is collected rather than stopping at the first.
    pub fn validate(&self, usage: Usage) -> Result<(), ConfigError> {
        let mut errors = parser_errors(&self.parser);
        if usage != Usage::Parse {
            errors.extend(server_errors(&self.server, &self.webhook));
        }
        if usage == Usage::ServeUrl {
            errors.extend(source_errors(&self.source));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(ConfigValidationErrors(errors)))
        }
    }
}

/// What the loaded configuration is about to be used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Usage {
    /// Offline parsing. Only the parser markers matter.
    Parse,
    /// Serving a local file. The source URL and timeout are unused.
    ServeFile,
    /// Serving a document fetched over HTTP.
    ServeUrl,
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: &ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.into(),
        source: err,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|err| ConfigError::Parse {
        path: path.into(),
        source: err,
    })?;
    Ok(raw.into_partial(source))
}

/// Configuration with every field optional, merged layer over layer.
#[derive(Debug, Default)]
struct PartialConfig {
    url: Option<String>,
    timeout_secs: Option<u64>,
    bind: Option<String>,
    route: Option<String>,
    secret_file: Option<PathBuf>,
    signature_header: Option<String>,
    title_prefix: Option<String>,
    divider: Option<String>,
    section_prefix: Option<String>,
    fence_marker: Option<String>,
}

impl PartialConfig {
    fn defaults() -> Self {
        PartialConfig {
            url: Some(DEFAULT_SOURCE_URL.to_string()),
            timeout_secs: Some(10),
            bind: Some("0.0.0.0:8080".to_string()),
            route: Some("/api/jetpack/articles".to_string()),
            secret_file: None,
            signature_header: Some("X-Hub-Signature".to_string()),
            title_prefix: Some("# ".to_string()),
            divider: Some("## Jetpacks".to_string()),
            section_prefix: Some("## ".to_string()),
            fence_marker: Some("```".to_string()),
        }
    }

    fn merge(&mut self, other: PartialConfig) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.url, other.url);
        take(&mut self.timeout_secs, other.timeout_secs);
        take(&mut self.bind, other.bind);
        take(&mut self.route, other.route);
        take(&mut self.secret_file, other.secret_file);
        take(&mut self.signature_header, other.signature_header);
        take(&mut self.title_prefix, other.title_prefix);
        take(&mut self.divider, other.divider);
        take(&mut self.section_prefix, other.section_prefix);
        take(&mut self.fence_marker, other.fence_marker);
    }

    fn finalize(self, sources: ConfigSources) -> Config {
        Config {
            source: SourceSettings {
                url: self.url.unwrap_or_default(),
                timeout: Duration::from_secs(self.timeout_secs.unwrap_or_default()),
            },
            server: ServerSettings {
                bind: self.bind.unwrap_or_default(),
                route: self.route.unwrap_or_default(),
            },
            webhook: WebhookSettings {
                secret_file: self.secret_file,
                signature_header: self.signature_header.unwrap_or_default(),
            },
            parser: ParserSettings {
                title_prefix: self.title_prefix.unwrap_or_default(),
                divider: self.divider.unwrap_or_default(),
                section_prefix: self.section_prefix.unwrap_or_default(),
                fence_marker: self.fence_marker.unwrap_or_default(),
            },
            sources,
        }
    }
}

fn parser_errors(parser: &ParserSettings) -> Vec<ConfigValidationError> {
    [
        ("title_prefix", &parser.title_prefix),
        ("divider", &parser.divider),
        ("section_prefix", &parser.section_prefix),
        ("fence_marker", &parser.fence_marker),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| ConfigValidationError::new("parser", format!("{name} must not be blank")))
    .collect()
}

fn server_errors(server: &ServerSettings, webhook: &WebhookSettings) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if let Err(err) = server.bind_addr() {
        errors.push(ConfigValidationError::new(
            "server",
            format!("invalid bind address '{}': {err}", server.bind),
        ));
    }
    if !server.route.starts_with('/') {
        errors.push(ConfigValidationError::new(
            "server",
            format!("route '{}' must start with '/'", server.route),
        ));
    }
    if webhook.signature_header.trim().is_empty() {
        errors.push(ConfigValidationError::new(
            "webhook",
            "signature_header must not be blank".to_string(),
        ));
    }

    errors
}

fn source_errors(source: &SourceSettings) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if !(source.url.starts_with("http://") || source.url.starts_with("https://")) {
        errors.push(ConfigValidationError::new(
            "source",
            format!("url '{}' is not http(s)", source.url),
        ));
    }
    if source.timeout.is_zero() {
        errors.push(ConfigValidationError::new(
            "source",
            "timeout_secs must be positive".to_string(),
        ));
    }

    errors
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bullets: Vec<String> = self.0.iter().map(|err| format!("- {err}")).collect();
        f.write_str(&bullets.join("\n"))
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// A single rejected setting, tagged with its TOML table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigValidationError {
    pub section: &'static str,
    pub message: String,
}

impl ConfigValidationError {
    fn new(section: &'static str, message: String) -> Self {
        ConfigValidationError { section, message }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.section, self.message)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    server: Option<RawServer>,
    #[serde(default)]
    webhook: Option<RawWebhook>,
    #[serde(default)]
    parser: Option<RawParser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSource {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServer {
    bind: Option<String>,
    route: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWebhook {
    secret_file: Option<PathBuf>,
    signature_header: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParser {
    title_prefix: Option<String>,
    divider: Option<String>,
    section_prefix: Option<String>,
    fence_marker: Option<String>,
}

impl RawConfig {
    fn into_partial(self, source: &ConfigSource) -> PartialConfig {
        let RawSource { url, timeout_secs } = self.source.unwrap_or_default();
        let RawServer { bind, route } = self.server.unwrap_or_default();
        let RawWebhook {
            secret_file,
            signature_header,
        } = self.webhook.unwrap_or_default();
        let RawParser {
            title_prefix,
            divider,
            section_prefix,
            fence_marker,
        } = self.parser.unwrap_or_default();

        PartialConfig {
            url,
            timeout_secs,
            bind,
            route,
            secret_file: secret_file.map(|path| make_absolute(&path, &source.base_dir)),
            signature_header,
            title_prefix,
            divider,
            section_prefix,
            fence_marker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ConfigSource {
        ConfigSource::for_file(
            ConfigSourceKind::Local,
            PathBuf::from("/srv/articles/.markdown-articles.toml"),
        )
    }

    fn sources() -> ConfigSources {
        ConfigSources {
            working_directory: PathBuf::from("/srv/articles"),
            layers: vec![source()],
        }
    }

    #[test]
    fn later_layers_override_earlier_ones() {
        let mut merged = PartialConfig::defaults();
        merged.merge(PartialConfig {
            divider: Some("## Articles".to_string()),
            ..PartialConfig::default()
        });

        assert_eq!(merged.divider.as_deref(), Some("## Articles"));
        assert_eq!(merged.section_prefix.as_deref(), Some("## "));
    }

    #[test]
    fn secret_path_is_relative_to_config_file() {
        let raw: RawConfig = toml::from_str(
            r#"
            [webhook]
            secret_file = "secret.txt"
            "#,
        )
        .unwrap();

        let partial = raw.into_partial(&source());

        assert_eq!(
            partial.secret_file,
            Some(PathBuf::from("/srv/articles/secret.txt"))
        );
    }

    #[test]
    fn validation_errors_render_as_bullets() {
        let errors = ConfigValidationErrors(vec![
            ConfigValidationError::new("parser", "first".to_string()),
            ConfigValidationError::new("source", "second".to_string()),
        ]);

        assert_eq!(errors.to_string(), "- parser: first\n- source: second");
    }

    #[test]
    fn blank_parser_markers_are_named() {
        let mut parser = PartialConfig::defaults().finalize(sources()).parser;
        parser.divider = " ".to_string();
        parser.fence_marker = String::new();

        let names: Vec<_> = parser_errors(&parser)
            .into_iter()
            .map(|err| err.message)
            .collect();

        assert_eq!(
            names,
            vec!["divider must not be blank", "fence_marker must not be blank"]
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        let parsed: Result<RawConfig, _> = toml::from_str("[parser]\nheading = \"# \"\n");
        assert!(parsed.is_err());
    }
}
