/*!
 * # Reelingo - background translation jobs for text and video
 *
 * A Rust library that accepts translation requests, runs them as background
 * jobs and reports progress until a scored result is available.
 *
 * ## Features
 *
 * - Asynchronous jobs with a bounded queue and a fixed worker pool
 * - Video input: audio extraction and transcription through pluggable collaborators
 * - Two provider families with a single fallback attempt:
 *   - Regional translation API
 *   - LLM backends (OpenAI, Anthropic, Ollama)
 * - Chunking of long text with overlap-aware merging
 * - Exponential-backoff retry per class of operation
 * - Heuristic quality scoring of every result
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `jobs`: Job records, registry and orchestrator
 * - `translation`: Strategy router and its engines:
 *   - `translation::core`: Provider selection, chunked translation and fallback
 *   - `translation::chunking`: Splitting and merging of long text
 *   - `translation::retry`: Retry policies
 *   - `translation::quality`: Quality evaluator
 *   - `translation::cache`: In-memory result cache
 * - `providers`: Translation backends and their registry
 * - `media`: Video source and transcriber contracts
 * - `api`: Request-layer facade
 * - `language_utils`: Language tag utilities
 * - `errors`: Custom error types for the application
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod api;
pub mod app_config;
pub mod errors;
pub mod jobs;
pub mod language_utils;
pub mod media;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use api::JobApi;
pub use app_config::Config;
pub use errors::{AppError, JobError, MediaError, ProviderError, TranslationError};
pub use jobs::{JobId, JobInput, JobOrchestrator, JobStatus, OrchestratorBuilder, ProcessingJob};
pub use language_utils::{get_language_name, language_tags_match, primary_subtag};
pub use providers::{Method, Provider, ProviderRegistry};
pub use translation::{TranslationResult, TranslationService};
