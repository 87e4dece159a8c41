use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use std::process::Command;
use std::time::Instant;

use crate::models::{BuildOutcome, BuildReport, BuildStep, Severity, StepMessage};
use crate::services::signing::SigningParams;

/// Target platform handed to the build engine.
///
/// Decided by the caller as plain configuration, never compiled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TargetPlatform {
    Android,
    Ios,
}

impl TargetPlatform {
    /// File extension of the artifact this platform produces.
    pub fn artifact_extension(&self) -> &'static str {
        match self {
            TargetPlatform::Android => "apk",
            TargetPlatform::Ios => "ipa",
        }
    }

    /// Stable identifier used on engine command lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPlatform::Android => "android",
            TargetPlatform::Ios => "ios",
        }
    }
}

/// Everything the build engine needs for one run: the platform, the enabled
/// scene/module paths, the allocated output path, and the resolved signing
/// parameters.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub platform: TargetPlatform,
    pub modules: Vec<Utf8PathBuf>,
    pub output_path: Utf8PathBuf,
    pub signing: SigningParams,
}

/// External toolchain that compiles, links, and packages the artifact.
///
/// Opaque to this crate: the pipeline only prepares its inputs and inspects
/// its report. A long-running blocking call with no progress callback; no
/// cancellation is supported mid-build.
pub trait BuildEngine {
    fn build(&mut self, request: &BuildRequest) -> Result<BuildReport>;
}

/// Build engine that shells out to a configured external program.
///
/// The program is invoked with the configured arguments, then
/// `-platform <p>`, each module path, and finally the output path. Signing
/// passwords travel via the `AUTOBUILD_KEYSTORE_PASS` / `AUTOBUILD_KEY_PASS`
/// environment variables, never argv. Exit status decides the outcome; the
/// report contains a single step with stdout lines as `Info` and stderr
/// lines as `Error` messages.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: Utf8PathBuf,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: Utf8PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }

    fn step_name(&self) -> String {
        let name = self.program.file_name().unwrap_or(self.program.as_str());
        format!("Invoke {name}")
    }
}

impl BuildEngine for CommandEngine {
    fn build(&mut self, request: &BuildRequest) -> Result<BuildReport> {
        tracing::info!(
            "Executing build engine: {} (platform {}, output {})",
            self.program,
            request.platform.as_str(),
            request.output_path
        );

        let start = Instant::now();

        let output = Command::new(self.program.as_str())
            .args(&self.args)
            .arg("-platform")
            .arg(request.platform.as_str())
            .args(request.modules.iter().map(|m| m.as_str()))
            .arg(request.output_path.as_str())
            .env("AUTOBUILD_KEYSTORE", request.signing.keystore_path.as_str())
            .env("AUTOBUILD_KEY_ALIAS", &request.signing.alias)
            .env("AUTOBUILD_KEYSTORE_PASS", &request.signing.store_password)
            .env("AUTOBUILD_KEY_PASS", &request.signing.alias_password)
            .output()
            .with_context(|| format!("Failed to spawn build engine: {}", self.program))?;

        let duration = start.elapsed();
        tracing::info!(
            "Build engine finished in {:.2}s with status {}",
            duration.as_secs_f32(),
            output.status
        );

        let mut messages = Vec::new();
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            messages.push(StepMessage::new(Severity::Info, line));
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            messages.push(StepMessage::new(Severity::Error, line));
        }

        let outcome = if output.status.success() {
            let total_size = fs::metadata(&request.output_path)
                .map(|m| m.len())
                .unwrap_or(0);
            BuildOutcome::Succeeded { total_size }
        } else {
            BuildOutcome::Failed
        };

        Ok(BuildReport {
            outcome,
            steps: vec![BuildStep {
                name: self.step_name(),
                messages,
            }],
        })
    }
}
