use std::collections::HashMap;
use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use toml::Spanned;

use super::diagnostics::Diagnostic;
use super::diagnostics::Error;
use super::diagnostics::LoadError;
use super::diagnostics::MergeConflictLocation;
use super::diagnostics::MergeError;
use super::diagnostics::SourceInfo;
use super::diagnostics::Warning;
use super::LogLevel;

/// One config file as written, before merging and validation.
#[derive(Debug, Default, Deserialize)]
pub struct PartialConfig {
    #[serde(default)]
    pub imports: Vec<String>,

    pub logging: Option<PartialLoggingConfig>,
    pub simulation: Option<PartialSimulationConfig>,
    pub console: Option<PartialConsoleConfig>,
    pub http: Option<PartialHttpConfig>,

    /// Source information for error reporting (not serialized)
    #[serde(skip)]
    pub source: Option<SourceInfo>,

    /// After merging: the file each field path was taken from
    #[serde(skip)]
    pub field_sources: HashMap<String, SourceInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialLoggingConfig {
    pub level: Option<Spanned<LogLevel>>,
    pub overrides: Option<HashMap<String, Spanned<LogLevel>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialSimulationConfig {
    pub tick_ms: Option<Spanned<u64>>,
    pub seed: Option<Spanned<u64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialConsoleConfig {
    pub enabled: Option<Spanned<bool>>,
    pub summary_interval_ms: Option<Spanned<u64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialHttpConfig {
    pub enabled: Option<Spanned<bool>>,
    pub listen: Option<Spanned<String>>,
    pub port: Option<Spanned<u16>>,
    pub refresh_ms: Option<Spanned<u64>>,
}

impl PartialConfig {
    /// Load a single config file without processing imports
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            error: e,
        })?;

        let mut config: PartialConfig = toml::from_str(&content).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            error: e,
        })?;

        config.source = Some(SourceInfo {
            file_path: path.to_path_buf(),
            content,
        });

        Ok(config)
    }

    /// Load config files with import resolution
    ///
    /// Returns every loaded file in order, imports before the file that
    /// imports them.
    pub fn load_with_imports(paths: &[PathBuf]) -> Result<Vec<Self>, LoadError> {
        let mut visited = HashSet::new();
        let mut all_configs = Vec::new();

        for path in paths {
            Self::load_recursive(path, &mut visited, &mut all_configs)?;
        }

        Ok(all_configs)
    }

    fn load_recursive(
        path: &Path,
        visited: &mut HashSet<PathBuf>,
        configs: &mut Vec<Self>,
    ) -> Result<(), LoadError> {
        let canonical_path = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        if visited.contains(&canonical_path) {
            return Err(LoadError::ImportCycle {
                path: canonical_path,
                cycle: visited.iter().cloned().collect(),
            });
        }

        visited.insert(canonical_path.clone());

        let config = Self::from_file(path)?;

        // Relative imports resolve against the importing file's directory
        let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
        for import in &config.imports {
            let import = PathBuf::from(import);
            let resolved = if import.is_absolute() {
                import
            } else {
                parent_dir.join(import)
            };
            Self::load_recursive(&resolved, visited, configs)?;
        }

        configs.push(config);

        // Only the current import chain counts towards cycles
        visited.remove(&canonical_path);

        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.imports.is_empty()
            && self.logging.is_none()
            && self.simulation.is_none()
            && self.console.is_none()
            && self.http.is_none()
    }

    /// Merge multiple partial configs together
    ///
    /// Uses first-wins semantics. A field set in more than one file is a
    /// conflict; all conflicts are collected before returning.
    pub fn merge<I>(configs: I) -> (Self, Vec<Diagnostic>)
    where
        I: IntoIterator<Item = Self>,
    {
        let mut result = PartialConfig::default();
        let mut diagnostics = Vec::new();
        let mut claimed: HashMap<String, MergeConflictLocation> = HashMap::new();

        for config in configs {
            let source = config.source.clone().unwrap_or_else(SourceInfo::unknown);

            if config.is_empty() {
                diagnostics.push(Diagnostic::Warning(Warning::EmptyConfig {
                    file_path: source.file_path.clone(),
                }));
            }

            result.imports.extend(config.imports);

            let mut merger = Merger {
                claimed: &mut claimed,
                diagnostics: &mut diagnostics,
                source: &source,
            };

            if let Some(logging) = config.logging {
                let into = result.logging.get_or_insert_with(Default::default);
                merger.field("logging.level", &mut into.level, logging.level);

                if let Some(overrides) = logging.overrides {
                    let into = into.overrides.get_or_insert_with(HashMap::new);
                    for (target, level) in overrides {
                        let path = format!("logging.overrides.{}", target);
                        if merger.claim(path, level.span()) {
                            into.insert(target, level);
                        }
                    }
                }
            }

            if let Some(simulation) = config.simulation {
                let into = result.simulation.get_or_insert_with(Default::default);
                merger.field("simulation.tick_ms", &mut into.tick_ms, simulation.tick_ms);
                merger.field("simulation.seed", &mut into.seed, simulation.seed);
            }

            if let Some(console) = config.console {
                let into = result.console.get_or_insert_with(Default::default);
                merger.field("console.enabled", &mut into.enabled, console.enabled);
                merger.field(
                    "console.summary_interval_ms",
                    &mut into.summary_interval_ms,
                    console.summary_interval_ms,
                );
            }

            if let Some(http) = config.http {
                let into = result.http.get_or_insert_with(Default::default);
                merger.field("http.enabled", &mut into.enabled, http.enabled);
                merger.field("http.listen", &mut into.listen, http.listen);
                merger.field("http.port", &mut into.port, http.port);
                merger.field("http.refresh_ms", &mut into.refresh_ms, http.refresh_ms);
            }
        }

        result.field_sources = claimed
            .into_iter()
            .map(|(path, location)| (path, location.source))
            .collect();

        (result, diagnostics)
    }
}

/// Tracks which file first set each field path.
struct Merger<'a> {
    claimed: &'a mut HashMap<String, MergeConflictLocation>,
    diagnostics: &'a mut Vec<Diagnostic>,
    source: &'a SourceInfo,
}

impl Merger<'_> {
    /// Record that the current file sets `path`. Returns false, and records a
    /// conflict, if an earlier file already did.
    fn claim(&mut self, path: String, span: Range<usize>) -> bool {
        let location = MergeConflictLocation {
            source: self.source.clone(),
            span,
        };

        if let Some(first) = self.claimed.get(&path) {
            self.diagnostics.push(Diagnostic::Error(Error::Merge(MergeError {
                field_path: path,
                conflicts: vec![first.clone(), location],
            })));
            false
        } else {
            self.claimed.insert(path, location);
            true
        }
    }

    fn field<T>(&mut self, path: &str, slot: &mut Option<Spanned<T>>, incoming: Option<Spanned<T>>) {
        if let Some(value) = incoming {
            if self.claim(path.to_string(), value.span()) {
                *slot = Some(value);
            }
        }
    }
}
