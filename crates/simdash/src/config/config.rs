//! Configuration file parsing and structures.
//!
//! simdash reads zero or more TOML files. Files may import other files;
//! every field may be set by at most one file. Anything left unset takes
//! its built-in default.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use toml::Spanned;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

use super::diagnostics::format_diagnostics;
use super::diagnostics::Diagnostic;
use super::diagnostics::Error;
use super::diagnostics::LoadError;
use super::diagnostics::SourceInfo;
use super::diagnostics::ValidationError;
use super::partial::PartialConfig;

#[derive(Debug, Default, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub simulation: SimulationConfig,
    pub console: ConsoleConfig,
    pub http: HttpConfig,
}

// LogLevel needs Deserialize because it's used in PartialLoggingConfig with toml::Spanned
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: LogLevel,

    /// Per-target levels, e.g. `"simdash::api" = "debug"`
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Subscriber filter for the default level plus the per-target overrides.
    pub fn filter(&self) -> Targets {
        Targets::new()
            .with_default(LevelFilter::from(self.level))
            .with_targets(
                self.overrides
                    .iter()
                    .map(|(target, level)| (target.clone(), LevelFilter::from(*level))),
            )
    }
}

/// Accepted range for `simulation.tick_ms`.
pub const TICK_MS_RANGE: std::ops::RangeInclusive<u64> = 1..=60_000;

/// Smallest accepted `http.refresh_ms`.
pub const MIN_REFRESH_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Period of the logical clock driving simulator and automation
    pub tick_ms: u64,

    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    pub enabled: bool,

    /// Print a one-line state summary this often; 0 disables it
    pub summary_interval_ms: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            summary_interval_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub enabled: bool,
    pub listen: String,
    pub port: u16,

    /// How often the HTML dashboard reloads itself
    pub refresh_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: "127.0.0.1".to_string(),
            port: 8565,
            refresh_ms: 1000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Rendered diagnostics
    #[error("{0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from TOML files with import resolution
    ///
    /// Returns the config together with any warnings. Fails if any file
    /// cannot be loaded or if any error diagnostic was raised; the error then
    /// carries every diagnostic, rendered.
    pub fn from_files(paths: &[PathBuf]) -> Result<(Self, Vec<Diagnostic>), ConfigError> {
        let configs = PartialConfig::load_with_imports(paths)?;
        let (partial, diagnostics) = PartialConfig::merge(configs);
        Self::from_partial(partial, diagnostics)
    }

    /// Convert a merged PartialConfig to a Config, validating all fields
    pub fn from_partial(
        partial: PartialConfig,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Result<(Self, Vec<Diagnostic>), ConfigError> {
        let mut check = Checker {
            diagnostics: &mut diagnostics,
            sources: &partial.field_sources,
        };

        let logging = partial
            .logging
            .map(|l| LoggingConfig {
                level: l.level.map(Spanned::into_inner).unwrap_or_default(),
                overrides: l
                    .overrides
                    .map(|o| o.into_iter().map(|(k, v)| (k, v.into_inner())).collect())
                    .unwrap_or_default(),
            })
            .unwrap_or_default();

        let mut simulation = SimulationConfig::default();
        if let Some(s) = partial.simulation {
            if let Some(tick_ms) = check.value("simulation.tick_ms", s.tick_ms, |v| {
                TICK_MS_RANGE.contains(v).then_some(()).ok_or_else(|| {
                    format!(
                        "tick_ms must be between {} and {}",
                        TICK_MS_RANGE.start(),
                        TICK_MS_RANGE.end()
                    )
                })
            }) {
                simulation.tick_ms = tick_ms;
            }
            simulation.seed = s.seed.map(Spanned::into_inner);
        }

        let mut console = ConsoleConfig::default();
        if let Some(c) = partial.console {
            if let Some(enabled) = c.enabled {
                console.enabled = enabled.into_inner();
            }
            if let Some(interval) = c.summary_interval_ms {
                console.summary_interval_ms = interval.into_inner();
            }
        }

        let mut http = HttpConfig::default();
        if let Some(h) = partial.http {
            if let Some(enabled) = h.enabled {
                http.enabled = enabled.into_inner();
            }
            if let Some(listen) = check.value("http.listen", h.listen, |v| {
                v.parse::<IpAddr>()
                    .map(|_| ())
                    .map_err(|_| format!("'{}' is not an IP address", v))
            }) {
                http.listen = listen;
            }
            if let Some(port) = check.value("http.port", h.port, |v| {
                (*v != 0)
                    .then_some(())
                    .ok_or_else(|| "port must be non-zero".to_string())
            }) {
                http.port = port;
            }
            if let Some(refresh_ms) = check.value("http.refresh_ms", h.refresh_ms, |v| {
                (*v >= MIN_REFRESH_MS)
                    .then_some(())
                    .ok_or_else(|| format!("refresh_ms must be at least {}", MIN_REFRESH_MS))
            }) {
                http.refresh_ms = refresh_ms;
            }
        }

        let config = Config {
            logging,
            simulation,
            console,
            http,
        };

        if diagnostics.iter().any(|d| d.is_error()) {
            Err(ConfigError::Invalid(format_diagnostics(&diagnostics)))
        } else {
            Ok((config, diagnostics))
        }
    }
}

/// Collects validation errors, pointing at the offending value.
struct Checker<'a> {
    diagnostics: &'a mut Vec<Diagnostic>,
    sources: &'a HashMap<String, SourceInfo>,
}

impl Checker<'_> {
    /// Unwrap a spanned value if `valid` accepts it; otherwise record a
    /// validation error and return None so the default is kept.
    fn value<T>(
        &mut self,
        field_path: &str,
        value: Option<Spanned<T>>,
        valid: impl FnOnce(&T) -> Result<(), String>,
    ) -> Option<T> {
        let value = value?;
        match valid(value.get_ref()) {
            Ok(()) => Some(value.into_inner()),
            Err(message) => {
                self.diagnostics
                    .push(Diagnostic::Error(Error::Validation(ValidationError {
                        field_path: field_path.to_string(),
                        message,
                        span: Some(value.span()),
                        source: self.sources.get(field_path).cloned(),
                    })));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_no_files_gives_defaults() {
        let (config, diagnostics) = Config::from_files(&[]).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(config.simulation, SimulationConfig::default());
        assert_eq!(config.http.port, 8565);
        assert!(config.console.enabled);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "simdash.toml",
            r#"
[logging]
level = "debug"

[logging.overrides]
"simdash::api" = "trace"

[simulation]
tick_ms = 100
seed = 7

[console]
enabled = false
summary_interval_ms = 2000

[http]
listen = "0.0.0.0"
port = 9000
refresh_ms = 500
"#,
        );

        let (config, diagnostics) = Config::from_files(&[path]).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(
            config.logging.overrides.get("simdash::api"),
            Some(&LogLevel::Trace)
        );
        assert_eq!(config.simulation.tick(), Duration::from_millis(100));
        assert_eq!(config.simulation.seed, Some(7));
        assert!(!config.console.enabled);
        assert_eq!(config.console.summary_interval_ms, 2000);
        assert!(config.http.enabled);
        assert_eq!(config.http.listen, "0.0.0.0");
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.refresh_ms, 500);
    }

    #[test]
    fn test_merge_non_overlapping_configs() {
        let dir = TempDir::new().unwrap();
        let base = write(&dir, "base.toml", "[simulation]\ntick_ms = 20\n");
        let extra = write(&dir, "extra.toml", "[simulation]\nseed = 3\n\n[http]\nenabled = false\n");

        let (config, diagnostics) = Config::from_files(&[base, extra]).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(config.simulation.tick_ms, 20);
        assert_eq!(config.simulation.seed, Some(3));
        assert!(!config.http.enabled);
    }

    #[test]
    fn test_conflict_detection() {
        let dir = TempDir::new().unwrap();
        let base = write(&dir, "base.toml", "[simulation]\ntick_ms = 20\n");
        let other = write(&dir, "other.toml", "[simulation]\ntick_ms = 30\n");

        let err = Config::from_files(&[base, other]).unwrap_err().to_string();
        assert!(err.contains("Merge conflict"));
        assert!(err.contains("simulation.tick_ms"));
    }

    #[test]
    fn test_override_conflict_is_per_target() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.toml", "[logging.overrides]\n\"simdash::api\" = \"debug\"\n");
        let b = write(&dir, "b.toml", "[logging.overrides]\n\"simdash::engine\" = \"warn\"\n");
        let (config, _) = Config::from_files(&[a.clone(), b]).unwrap();
        assert_eq!(config.logging.overrides.len(), 2);

        let c = write(&dir, "c.toml", "[logging.overrides]\n\"simdash::api\" = \"trace\"\n");
        let err = Config::from_files(&[a, c]).unwrap_err().to_string();
        assert!(err.contains("logging.overrides.simdash::api"));
    }

    #[test]
    fn test_import_resolution() {
        let dir = TempDir::new().unwrap();
        write(&dir, "base.toml", "[logging]\nlevel = \"warn\"\n");
        let main = write(
            &dir,
            "main.toml",
            "imports = [\"base.toml\"]\n\n[http]\nport = 8080\n",
        );

        let (config, _) = Config::from_files(&[main]).unwrap();
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_import_cycle() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.toml", "imports = [\"b.toml\"]\n");
        let b = write(&dir, "b.toml", "imports = [\"a.toml\"]\n");

        let err = Config::from_files(&[b]).unwrap_err();
        assert!(matches!(err, ConfigError::Load(LoadError::ImportCycle { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_files(&[PathBuf::from("/nonexistent/simdash.toml")]).unwrap_err();
        assert!(matches!(err, ConfigError::Load(LoadError::Io { .. })));
    }

    #[test]
    fn test_empty_config_warning() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "empty.toml", "# nothing here\n");

        let (_, diagnostics) = Config::from_files(&[empty]).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_warning());
        assert!(format_diagnostics(&diagnostics).contains("empty.toml"));
    }

    #[test]
    fn test_validation_errors_are_collected() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "bad.toml",
            "[simulation]\ntick_ms = 0\n\n[http]\nlisten = \"localhost\"\nport = 0\nrefresh_ms = 10\n",
        );

        let err = Config::from_files(&[path]).unwrap_err().to_string();
        for field in ["simulation.tick_ms", "http.listen", "http.port", "http.refresh_ms"] {
            assert!(err.contains(field), "missing {} in:\n{}", field, err);
        }
    }

    #[test]
    fn test_ipv6_listen_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "v6.toml", "[http]\nlisten = \"::1\"\nport = 18565\n");
        let (config, _) = Config::from_files(&[path]).unwrap();
        assert_eq!(config.http.listen, "::1");
    }

    #[test]
    fn test_bad_log_level_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.toml", "[logging]\nlevel = \"loud\"\n");
        let err = Config::from_files(&[path]).unwrap_err();
        assert!(matches!(err, ConfigError::Load(LoadError::Parse { .. })));
    }
}
