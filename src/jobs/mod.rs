/*!
 * Asynchronous translation jobs.
 *
 * - `models`: job records and their state machine
 * - `registry`: the in-memory job map owned by the orchestrator
 * - `orchestrator`: admission queue, worker pool, stage pipeline and sweeper
 */

pub mod models;
pub mod orchestrator;
mod registry;

pub use models::{JobFailure, JobId, JobInput, JobStage, JobStatus, ProcessingJob};
pub use orchestrator::{JobOrchestrator, OrchestratorBuilder};
pub use registry::JobStats;
