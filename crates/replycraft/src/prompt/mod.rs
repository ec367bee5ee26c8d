//! Prompt construction.
//!
//! Three layers, each usable on its own:
//!
//! 1. **[`PromptBuilder`]** joins an opening block, headed sections, and raw
//!    paragraphs into one string, skipping empty blocks.
//! 2. **[`PromptRegistry`]** holds (condition, renderer) sections over a
//!    context type and assembles the ones that apply, in priority order.
//! 3. **[`ReplyPrompt`]** is the registry for reply suggestions: it turns a
//!    [`ReplyRequest`](crate::request::ReplyRequest) into a
//!    [`RenderedPrompt`] carrying the instruction text and output schema.

pub mod builder;
pub mod registry;
pub mod reply;

pub use builder::PromptBuilder;
pub use registry::{PromptRegistry, PromptSection};
pub use reply::{OUTPUT_SCHEMA_NAME, RenderedPrompt, ReplyPrompt, reply_prompt_registry};
