// Services module
//
// The pipeline stages: signing resolution, artifact path allocation, the
// build engine boundary, and the orchestrator that sequences them.

pub mod allocator;
pub mod engine;
pub mod orchestrator;
pub mod signing;

pub use allocator::allocate_artifact_path;
pub use engine::{BuildEngine, BuildRequest, CommandEngine, TargetPlatform};
pub use orchestrator::{BuildOrchestrator, BuildPhase};
pub use signing::{LegacySettingsSink, NoopSettingsSink, SigningParams};
