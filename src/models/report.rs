use camino::Utf8PathBuf;
use std::fmt;

/// Severity of a single build step message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Debug,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
            Severity::Debug => "Debug",
        };
        f.write_str(s)
    }
}

/// One message emitted by a build step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMessage {
    pub severity: Severity,
    pub content: String,
}

impl StepMessage {
    pub fn new(severity: Severity, content: impl Into<String>) -> Self {
        Self {
            severity,
            content: content.into(),
        }
    }
}

/// One step of a build engine run, with its ordered messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    pub name: String,
    pub messages: Vec<StepMessage>,
}

/// Overall result of a build engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Succeeded { total_size: u64 },
    Failed,
}

/// Report handed back by the build engine: an overall outcome plus the
/// ordered steps that produced it.
///
/// On failure the full report (all steps, all severities) is written to
/// `buildErrors.log` for postmortem use, while only the `Error`-severity
/// messages are echoed to the immediate caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub outcome: BuildOutcome,
    pub steps: Vec<BuildStep>,
}

impl BuildReport {
    /// Iterate over all `Error`-severity messages, paired with their step name.
    pub fn error_messages(&self) -> impl Iterator<Item = (&str, &StepMessage)> {
        self.steps.iter().flat_map(|step| {
            step.messages
                .iter()
                .filter(|m| m.severity == Severity::Error)
                .map(move |m| (step.name.as_str(), m))
        })
    }

    /// Count of `Error`-severity messages across all steps.
    pub fn error_count(&self) -> usize {
        self.error_messages().count()
    }
}

/// A successfully produced build artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub path: Utf8PathBuf,
    pub size_bytes: u64,
}
