use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt::Write as _;
use std::fs;

use crate::config::load_build_config;
use crate::error::BuildError;
use crate::models::{BuildArtifact, BuildConfig, BuildOutcome, BuildReport};
use crate::services::allocator::allocate_artifact_path;
use crate::services::engine::{BuildEngine, BuildRequest, TargetPlatform};
use crate::services::signing::{self, LegacySettingsSink, NoopSettingsSink};
use crate::state::CounterStore;

/// Name of the postmortem log written next to the artifacts on engine failure.
pub const ERROR_LOG_FILE_NAME: &str = "buildErrors.log";

/// Default output directory under the project root when the config leaves
/// `parentFolder` blank.
pub const DEFAULT_OUTPUT_DIR: &str = "Builds";

/// Lifecycle of a single pipeline invocation.
///
/// `Succeeded` and `Failed` are terminal; no retries happen inside the
/// pipeline. Retry policy, if any, belongs to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    ConfigLoaded,
    ResolvedAllocated,
    Building,
    Succeeded,
    Failed,
}

/// Composition root for one build invocation.
///
/// Sequences config loading, signing resolution, artifact path allocation,
/// the build engine run, and report inspection. Single-threaded and
/// blocking: each stage completes fully before the next begins, and the
/// engine call runs to completion or failure with no cancellation.
///
/// Only one invocation per project is assumed in flight at a time;
/// concurrent runs against the same counter store or output directory must
/// be serialized by the caller.
pub struct BuildOrchestrator<E, S> {
    project_root: Utf8PathBuf,
    config_path: Utf8PathBuf,
    platform: TargetPlatform,
    modules: Vec<Utf8PathBuf>,
    engine: E,
    counter: S,
    sink: Box<dyn LegacySettingsSink>,
    phase: BuildPhase,
}

impl<E: BuildEngine, S: CounterStore> BuildOrchestrator<E, S> {
    /// Create an orchestrator for `project_root`, using the conventional
    /// config location and the Android platform.
    pub fn new(project_root: Utf8PathBuf, engine: E, counter: S) -> Self {
        let config_path = crate::config::default_config_path(&project_root);
        Self {
            project_root,
            config_path,
            platform: TargetPlatform::Android,
            modules: Vec::new(),
            engine,
            counter,
            sink: Box::new(NoopSettingsSink),
            phase: BuildPhase::Idle,
        }
    }

    /// Override the config file location.
    pub fn with_config_path(mut self, path: Utf8PathBuf) -> Self {
        self.config_path = path;
        self
    }

    pub fn with_platform(mut self, platform: TargetPlatform) -> Self {
        self.platform = platform;
        self
    }

    /// Enabled scene/module paths handed to the engine.
    pub fn with_modules(mut self, modules: Vec<Utf8PathBuf>) -> Self {
        self.modules = modules;
        self
    }

    /// Install a legacy settings sink. Sink failures are logged and
    /// swallowed, never propagated.
    pub fn with_legacy_sink(mut self, sink: Box<dyn LegacySettingsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Run the pipeline to completion.
    ///
    /// Config errors abort before any filesystem mutation. An unwritable
    /// output directory aborts before the counter is persisted. An engine
    /// failure writes `buildErrors.log` into the output directory and
    /// raises [`BuildError::EngineFailure`] referencing it.
    pub fn run(&mut self) -> Result<BuildArtifact> {
        match self.run_pipeline() {
            Ok(artifact) => {
                self.phase = BuildPhase::Succeeded;
                tracing::info!(
                    "Build succeeded: {} bytes -> {}",
                    artifact.size_bytes,
                    artifact.path
                );
                Ok(artifact)
            }
            Err(e) => {
                self.phase = BuildPhase::Failed;
                Err(e)
            }
        }
    }

    fn run_pipeline(&mut self) -> Result<BuildArtifact> {
        let config = load_build_config(&self.config_path)?;
        self.phase = BuildPhase::ConfigLoaded;

        let output_dir = self.output_directory(&config);

        let params = signing::resolve(&config, &self.project_root);
        signing::mirror_to_legacy(self.sink.as_mut(), &params);

        let extension = self.platform.artifact_extension();
        let output_path = allocate_artifact_path(&output_dir, &mut self.counter, extension)?;
        self.phase = BuildPhase::ResolvedAllocated;

        let request = BuildRequest {
            platform: self.platform,
            modules: self.modules.clone(),
            output_path: output_path.clone(),
            signing: params,
        };

        self.phase = BuildPhase::Building;
        let report = self.engine.build(&request)?;

        match report.outcome {
            BuildOutcome::Succeeded { total_size } => Ok(BuildArtifact {
                path: output_path,
                size_bytes: total_size,
            }),
            BuildOutcome::Failed => {
                tracing::error!("Build failed");
                for (step_name, message) in report.error_messages() {
                    tracing::error!("[Step: {step_name}] {}", message.content);
                }

                let log_path = output_dir.join(ERROR_LOG_FILE_NAME);
                write_error_log(&report, &log_path)?;
                tracing::error!("Wrote {ERROR_LOG_FILE_NAME} to: {log_path}");

                Err(BuildError::EngineFailure {
                    error_count: report.error_count(),
                    log_path,
                }
                .into())
            }
        }
    }

    /// Output directory: the configured parent folder, or
    /// `<project_root>/Builds` when blank.
    fn output_directory(&self, config: &BuildConfig) -> Utf8PathBuf {
        match config.parent_folder_trimmed() {
            Some(folder) => Utf8PathBuf::from(folder),
            None => self.project_root.join(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Write the full report (every step, every severity) to `log_path` for
/// postmortem use, even though only errors are echoed to the caller.
fn write_error_log(report: &BuildReport, log_path: &Utf8Path) -> Result<()> {
    let mut out = String::new();

    // writeln! into a String cannot fail.
    let _ = writeln!(out, "*Build Errors ({} steps):", report.steps.len());
    for step in &report.steps {
        let _ = writeln!(
            out,
            "**Step: {} | Messages: {}",
            step.name,
            step.messages.len()
        );
        for message in &step.messages {
            let _ = writeln!(out, "   - {}: {}", message.severity, message.content);
        }
    }

    fs::write(log_path, out).with_context(|| format!("Failed to write error log: {log_path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildStep, Severity, StepMessage};
    use crate::state::{MemoryCounterStore, LAST_INDEX_KEY};
    use mockall::mock;
    use mockall::predicate::always;
    use tempfile::TempDir;

    mock! {
        Engine {}
        impl BuildEngine for Engine {
            fn build(&mut self, request: &BuildRequest) -> Result<BuildReport>;
        }
    }

    fn project_with_config(json: &str) -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        fs::write(root.join("build_config.json"), json).unwrap();
        (dir, root)
    }

    fn succeeded_report(total_size: u64) -> BuildReport {
        BuildReport {
            outcome: BuildOutcome::Succeeded { total_size },
            steps: vec![],
        }
    }

    fn failed_report() -> BuildReport {
        BuildReport {
            outcome: BuildOutcome::Failed,
            steps: vec![BuildStep {
                name: "Compile".to_string(),
                messages: vec![
                    StepMessage::new(Severity::Error, "undefined symbol"),
                    StepMessage::new(Severity::Info, "1 file processed"),
                ],
            }],
        }
    }

    #[test]
    fn test_successful_run() {
        let (_guard, root) = project_with_config(
            r#"{"keyAlias": "rel", "keystorePassword": "pw1"}"#,
        );

        let mut engine = MockEngine::new();
        engine
            .expect_build()
            .with(always())
            .times(1)
            .returning(|_| Ok(succeeded_report(4096)));

        let mut orch = BuildOrchestrator::new(root.clone(), engine, MemoryCounterStore::new());
        let artifact = orch.run().unwrap();

        assert_eq!(artifact.path, root.join("Builds/Build1.apk"));
        assert_eq!(artifact.size_bytes, 4096);
        assert_eq!(orch.phase(), BuildPhase::Succeeded);
    }

    #[test]
    fn test_engine_receives_allocated_path_and_signing() {
        let (_guard, root) = project_with_config(
            r#"{"keyAlias": " rel ", "keystorePassword": "pw1", "keyPassword": ""}"#,
        );

        let expected_output = root.join("Builds/Build1.apk");
        let expected_keystore = root.join("build_data_keystore.keystore");

        let mut engine = MockEngine::new();
        engine.expect_build().times(1).returning(move |request| {
            assert_eq!(request.output_path, expected_output);
            assert_eq!(request.signing.keystore_path, expected_keystore);
            assert_eq!(request.signing.alias, "rel");
            assert_eq!(request.signing.alias_password, "pw1");
            assert_eq!(request.platform, TargetPlatform::Android);
            Ok(succeeded_report(1))
        });

        let mut orch = BuildOrchestrator::new(root, engine, MemoryCounterStore::new());
        orch.run().unwrap();
    }

    #[test]
    fn test_missing_config_fails_fast() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let mut engine = MockEngine::new();
        engine.expect_build().times(0);

        let mut orch = BuildOrchestrator::new(root.clone(), engine, MemoryCounterStore::new());
        let err = orch.run().unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ConfigNotFound { .. })
        ));
        assert_eq!(orch.phase(), BuildPhase::Failed);
        // Fail fast: no filesystem mutation before validation.
        assert!(!root.join("Builds").exists());
    }

    #[test]
    fn test_invalid_config_leaves_counter_untouched() {
        let (_guard, root) = project_with_config(
            r#"{"keyAlias": "", "keystorePassword": "pw1"}"#,
        );

        let mut engine = MockEngine::new();
        engine.expect_build().times(0);

        let mut orch = BuildOrchestrator::new(root, engine, MemoryCounterStore::new());
        assert!(orch.run().is_err());
        assert_eq!(orch.counter.get(LAST_INDEX_KEY).unwrap(), 0);
    }

    #[test]
    fn test_engine_failure_writes_error_log() {
        let (_guard, root) = project_with_config(
            r#"{"keyAlias": "rel", "keystorePassword": "pw1"}"#,
        );

        let mut engine = MockEngine::new();
        engine
            .expect_build()
            .times(1)
            .returning(|_| Ok(failed_report()));

        let mut orch = BuildOrchestrator::new(root.clone(), engine, MemoryCounterStore::new());
        let err = orch.run().unwrap_err();

        let log_path = root.join("Builds/buildErrors.log");
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::EngineFailure {
                error_count,
                log_path: reported,
            }) => {
                // One Error message; the Info line is logged but not counted.
                assert_eq!(*error_count, 1);
                assert_eq!(reported, &log_path);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let log = fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("*Build Errors (1 steps):"));
        assert!(log.contains("**Step: Compile | Messages: 2"));
        assert!(log.contains("   - Error: undefined symbol"));
        assert!(log.contains("   - Info: 1 file processed"));
    }

    #[test]
    fn test_parent_folder_overrides_default() {
        let dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let custom = root.join("custom-out");
        let json = format!(
            r#"{{"parentFolder": "{custom}", "keyAlias": "rel", "keystorePassword": "pw1"}}"#
        );
        fs::write(root.join("build_config.json"), json).unwrap();

        let mut engine = MockEngine::new();
        engine
            .expect_build()
            .times(1)
            .returning(|_| Ok(succeeded_report(1)));

        let mut orch = BuildOrchestrator::new(root.clone(), engine, MemoryCounterStore::new());
        let artifact = orch.run().unwrap();

        assert_eq!(artifact.path, custom.join("Build1.apk"));
        assert!(!root.join("Builds").exists());
    }

    #[test]
    fn test_second_run_allocates_next_index() {
        let (_guard, root) = project_with_config(
            r#"{"keyAlias": "rel", "keystorePassword": "pw1"}"#,
        );

        // The engine writes the artifact, as the real toolchain would.
        let mut engine = MockEngine::new();
        engine.expect_build().times(2).returning(|request| {
            fs::write(&request.output_path, b"apk").unwrap();
            Ok(succeeded_report(3))
        });

        let mut orch = BuildOrchestrator::new(root.clone(), engine, MemoryCounterStore::new());
        let first = orch.run().unwrap();
        let second = orch.run().unwrap();

        assert_eq!(first.path, root.join("Builds/Build1.apk"));
        assert_eq!(second.path, root.join("Builds/Build2.apk"));
    }

    #[test]
    fn test_ios_platform_extension() {
        let (_guard, root) = project_with_config(
            r#"{"keyAlias": "rel", "keystorePassword": "pw1"}"#,
        );

        let mut engine = MockEngine::new();
        engine
            .expect_build()
            .times(1)
            .returning(|_| Ok(succeeded_report(1)));

        let mut orch = BuildOrchestrator::new(root.clone(), engine, MemoryCounterStore::new())
            .with_platform(TargetPlatform::Ios);
        let artifact = orch.run().unwrap();

        assert_eq!(artifact.path, root.join("Builds/Build1.ipa"));
    }
}
