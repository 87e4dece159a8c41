//! autobuild - deterministic signed-build configuration and artifact naming
//!
//! CLI entry point. Wires the pipeline together for one blocking build
//! invocation:
//!
//! 1. Initialize logging -> logs/autobuild.<date>
//! 2. Open the durable counter store (`.autobuild-prefs.json` at the
//!    project root)
//! 3. Run the orchestrator: load `build_config.json`, resolve signing,
//!    allocate the output path, invoke the external build engine
//! 4. Print the artifact path and size, or exit non-zero with the error
//!    (and, on an engine failure, the `buildErrors.log` location)
//!
//! The external engine is any program that accepts the platform flag,
//! module paths, and the output path as its final argument; signing
//! material reaches it through `AUTOBUILD_*` environment variables.

use anyhow::{Context, Result};
use autobuild::services::{BuildOrchestrator, CommandEngine, TargetPlatform};
use autobuild::{APP_NAME, PrefsCounterStore, VERSION};
use camino::Utf8PathBuf;
use clap::Parser;

/// File name of the durable counter store at the project root.
const PREFS_FILE_NAME: &str = ".autobuild-prefs.json";

#[derive(Parser, Debug)]
#[command(name = "autobuild", version, about = "Signed player builds with collision-free output numbering")]
struct Cli {
    /// Project root directory
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Build config file (default: <project_root>/build_config.json)
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Target platform handed to the build engine
    #[arg(long, value_enum, default_value = "android")]
    platform: TargetPlatform,

    /// Enabled scene/module path (repeatable)
    #[arg(long = "module")]
    modules: Vec<Utf8PathBuf>,

    /// Build engine program to invoke
    #[arg(long)]
    engine: Utf8PathBuf,

    /// Extra argument for the build engine (repeatable)
    #[arg(long = "engine-arg")]
    engine_args: Vec<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = autobuild::logging::setup_logging("logs", "autobuild", cli.debug, true)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    // The keystore convention anchors on the project root, so it must be
    // absolute before anything derives paths from it.
    let project_root = std::fs::canonicalize(&cli.project_root)
        .with_context(|| format!("Project root not found: {}", cli.project_root))?;
    let project_root = Utf8PathBuf::try_from(project_root)
        .context("Project root is not valid UTF-8")?;

    let counter = PrefsCounterStore::open(project_root.join(PREFS_FILE_NAME))?;
    let engine = CommandEngine::new(cli.engine, cli.engine_args);

    let mut orchestrator = BuildOrchestrator::new(project_root.clone(), engine, counter)
        .with_platform(cli.platform)
        .with_modules(cli.modules);
    if let Some(config) = cli.config {
        orchestrator = orchestrator.with_config_path(config);
    }

    let artifact = orchestrator.run()?;
    println!("{} ({} bytes)", artifact.path, artifact.size_bytes);

    Ok(())
}
