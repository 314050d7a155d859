//! Job store and background clipping pipelines.
//!
//! The [`Orchestrator`] is the boundary used by the HTTP layer: it validates
//! submissions, registers records in the [`JobStore`] and runs each job as an
//! independent tokio task.

pub mod archive;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod store;

pub use config::WorkerConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::JobLogger;
pub use orchestrator::{ClipPreviewSet, Orchestrator, Submission, LATEST_VIDEO_ID};
pub use store::{JobStore, JobWriter, VideoWriter};
