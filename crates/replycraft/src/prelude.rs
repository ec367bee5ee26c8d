//! Convenience re-exports for common `replycraft` types.
//!
//! Meant to be glob-imported:
//!
//! ```ignore
//! use replycraft::prelude::*;
//! ```
//!
//! Covers the request model, prompt rendering, and the generator seam.
//! Raw wire types (`ResponseFormat`, `UsageInfo`) stay in the crate root.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{GenerationError, Message, OpenRouterClient, json_schema_for};

// ── Request model ───────────────────────────────────────────────────
pub use crate::request::{
    Goal, InputDiagnostics, Language, Mood, RelationshipVibe, ReplyRequest, ReplyResponse,
    SenderType, Timing, Tone,
};

// ── Prompt ──────────────────────────────────────────────────────────
pub use crate::prompt::{PromptBuilder, PromptRegistry, RenderedPrompt, ReplyPrompt};

// ── Generation ──────────────────────────────────────────────────────
pub use crate::generation::{
    GenerationFuture, GeneratorConfig, OpenRouterGenerator, ReplyGenerator, parse_reply_content,
};
