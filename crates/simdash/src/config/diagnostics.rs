use std::ops::Range;
use std::path::PathBuf;

/// Source information for where a diagnostic came from
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub file_path: PathBuf,
    pub content: String,
}

impl SourceInfo {
    pub fn unknown() -> Self {
        Self {
            file_path: PathBuf::from("<unknown>"),
            content: String::new(),
        }
    }

    fn id(&self) -> String {
        self.file_path.to_string_lossy().to_string()
    }
}

/// A diagnostic message that can be either a warning or an error
#[derive(Debug, Clone)]
pub enum Diagnostic {
    Warning(Warning),
    Error(Error),
}

/// Warning messages that don't prevent config loading
#[derive(Debug, Clone)]
pub enum Warning {
    EmptyConfig { file_path: PathBuf },
}

/// Error messages that indicate problems with the config
#[derive(Debug, Clone)]
pub enum Error {
    Merge(MergeError),
    Validation(ValidationError),
}

/// The same field was set by more than one file
#[derive(Debug, Clone)]
pub struct MergeError {
    pub field_path: String,
    pub conflicts: Vec<MergeConflictLocation>,
}

#[derive(Debug, Clone)]
pub struct MergeConflictLocation {
    pub source: SourceInfo,
    pub span: Range<usize>,
}

/// A field holds a value outside what it accepts
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field_path: String,
    pub message: String,
    pub span: Option<Range<usize>>,
    pub source: Option<SourceInfo>,
}

/// Error type for config loading failures (parse errors, IO errors, etc.)
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read '{}': {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Failed to parse '{}': {error}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        error: toml::de::Error,
    },

    #[error("Import cycle detected at '{}': involves {} file(s)", path.display(), cycle.len())]
    ImportCycle { path: PathBuf, cycle: Vec<PathBuf> },
}

impl Diagnostic {
    /// Returns true if this diagnostic is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Diagnostic::Error(_))
    }

    /// Returns true if this diagnostic is a warning
    pub fn is_warning(&self) -> bool {
        matches!(self, Diagnostic::Warning(_))
    }
}

/// Format all diagnostics for display using Ariadne
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut output = Vec::new();

    for diagnostic in diagnostics {
        match diagnostic {
            Diagnostic::Warning(Warning::EmptyConfig { file_path }) => {
                let msg = format!(
                    "Warning: Config file '{}' is empty and has no effect\n",
                    file_path.display()
                );
                output.extend_from_slice(msg.as_bytes());
            }
            Diagnostic::Error(Error::Merge(merge_error)) => {
                write_merge_error(merge_error, &mut output);
            }
            Diagnostic::Error(Error::Validation(validation_error)) => {
                write_validation_error(validation_error, &mut output);
            }
        }
    }

    String::from_utf8_lossy(&output).to_string()
}

fn write_merge_error(merge_error: &MergeError, output: &mut Vec<u8>) {
    use ariadne::{sources, Color, Label, Report, ReportKind};

    let Some(first) = merge_error.conflicts.first() else {
        return;
    };

    let mut report = Report::build(ReportKind::Error, (first.source.id(), first.span.clone()))
        .with_message(format!("Merge conflict in field '{}'", merge_error.field_path))
        .with_note("each field may only be set by one config file");

    for (idx, conflict) in merge_error.conflicts.iter().enumerate() {
        let (label_msg, color) = if idx == 0 {
            ("first definition here", Color::Red)
        } else {
            ("conflicts with this definition", Color::Yellow)
        };
        report = report.with_label(
            Label::new((conflict.source.id(), conflict.span.clone()))
                .with_message(label_msg)
                .with_color(color),
        );
    }

    // One cache covering every file involved, so cross-file labels resolve.
    let files: Vec<(String, String)> = merge_error
        .conflicts
        .iter()
        .map(|c| (c.source.id(), c.source.content.clone()))
        .collect();

    report.finish().write(sources(files), &mut *output).ok();
}

fn write_validation_error(validation_error: &ValidationError, output: &mut Vec<u8>) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    match (&validation_error.span, &validation_error.source) {
        (Some(span), Some(source)) => {
            let id = source.id();
            Report::build(ReportKind::Error, (id.clone(), span.clone()))
                .with_message(format!(
                    "Validation error in '{}'",
                    validation_error.field_path
                ))
                .with_label(
                    Label::new((id.clone(), span.clone()))
                        .with_message(&validation_error.message)
                        .with_color(Color::Red),
                )
                .finish()
                .write((id, Source::from(&source.content)), &mut *output)
                .ok();
        }
        _ => {
            let msg = format!(
                "Validation error in '{}': {}\n",
                validation_error.field_path, validation_error.message
            );
            output.extend_from_slice(msg.as_bytes());
        }
    }
}
