//! Block-structured prompt builder.
//!
//! [`PromptBuilder`] assembles a prompt from an opening block followed by
//! headed sections and raw paragraphs, joined by blank lines. Empty blocks are
//! skipped, so a caller never has to guard against stray separators.

/// Builder for multi-block prompts.
///
/// # Example
///
/// ```
/// use replycraft::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new("You write replies.")
///     .raw("The user received a message.")
///     .section("Tone", "")
///     .section("Language", "Reply in English.")
///     .build();
///
/// assert_eq!(
///     prompt,
///     "You write replies.\n\nThe user received a message.\n\n## Language\n\nReply in English."
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    blocks: Vec<String>,
}

impl PromptBuilder {
    /// Start a prompt with an opening block. The opening block has no heading.
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            blocks: vec![preamble.into()],
        }
    }

    /// Append a `##` section. Skipped if `content` is empty.
    pub fn section(mut self, heading: &str, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.blocks.push(format!("## {heading}\n\n{content}"));
        }
        self
    }

    /// Append a paragraph without a heading. Skipped if empty.
    pub fn raw(mut self, content: impl Into<String>) -> Self {
        let content = content.into();
        if !content.is_empty() {
            self.blocks.push(content);
        }
        self
    }

    /// Join all blocks with blank lines.
    pub fn build(self) -> String {
        self.blocks.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_only() {
        assert_eq!(PromptBuilder::new("Persona.").build(), "Persona.");
    }

    #[test]
    fn section_gets_heading() {
        let prompt = PromptBuilder::new("P").section("Tone", "Be dry.").build();
        assert_eq!(prompt, "P\n\n## Tone\n\nBe dry.");
    }

    #[test]
    fn empty_blocks_leave_no_separator() {
        let prompt = PromptBuilder::new("P")
            .section("Empty", "")
            .raw("")
            .build();
        assert_eq!(prompt, "P");
    }

    #[test]
    fn blocks_keep_call_order() {
        let prompt = PromptBuilder::new("P")
            .raw("one")
            .section("Two", "two")
            .raw("three")
            .build();
        assert_eq!(prompt, "P\n\none\n\n## Two\n\ntwo\n\nthree");
    }
}
