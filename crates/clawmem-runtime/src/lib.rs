//! `clawmem-runtime` – The memory plugin core.
//!
//! Wires the capture-decision engine and the worker client into the two
//! lifecycle hooks a conversational host calls around every turn, plus the
//! direct memory tools.
//!
//! # Modules
//!
//! - [`plugin`] – [`MemoryPlugin`]: owns the store, the dedup cache and both
//!   hooks; the single object a host registers.
//! - [`recall`] – [`RecallHook`]: prompt → sanitised search →
//!   `<relevant-memories>` context block within a token budget.
//! - [`capture`] – [`CaptureHook`]: successful turn → capture pipeline.
//! - [`tools`] – [`MemoryTools`]: `memory_search`, `memory_store`,
//!   `memory_get`, `memory_delete` with `schemars` parameter schemas.
//! - [`config`] – [`PluginConfig`]: host-supplied settings.
//! - [`telemetry`] – [`init_tracing`]: `tracing` subscriber with optional
//!   OTLP export.
//!
//! # Failure policy
//!
//! Hooks never fail the host's turn.  Every storage error, timeout or
//! cancellation is logged and degrades to "no context" / "nothing captured".

pub mod capture;
pub mod config;
pub mod plugin;
pub mod recall;
pub mod telemetry;
pub mod tools;

pub use capture::{CaptureHook, DEFAULT_SESSION_KEY, TurnEnd};
pub use config::PluginConfig;
pub use plugin::MemoryPlugin;
pub use recall::{RecallHook, format_context};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use tools::{MemoryTools, ToolDefinition, ToolOutput, definitions};

// Hosts that only depend on the runtime still need the cancellation type.
pub use tokio_util::sync::CancellationToken;
