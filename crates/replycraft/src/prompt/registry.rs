//! Ordered registry of conditional prompt sections.
//!
//! A [`PromptRegistry`] holds (condition, renderer) pairs over some context
//! type `C`. [`assemble`](PromptRegistry::assemble) evaluates them in
//! priority order, skips sections whose condition is false or whose content
//! renders empty, and feeds the rest through a [`PromptBuilder`].

use super::builder::PromptBuilder;

type Condition<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;
type Renderer<C> = Box<dyn Fn(&C) -> String + Send + Sync>;

/// A named prompt section with a condition and content renderer.
pub struct PromptSection<C> {
    /// Name reported by [`PromptRegistry::active_sections`].
    pub name: String,
    /// Markdown heading. Empty means the content is emitted as a raw paragraph.
    pub heading: String,
    /// Lower priorities are emitted first. Ties keep registration order.
    pub priority: u32,
    pub condition: Condition<C>,
    pub content: Renderer<C>,
}

impl<C> std::fmt::Debug for PromptSection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptSection")
            .field("name", &self.name)
            .field("heading", &self.heading)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Registry of prompt sections evaluated in a fixed order.
///
/// # Example
///
/// ```
/// use replycraft::prompt::PromptRegistry;
///
/// let mut registry = PromptRegistry::<Option<&str>>::new("You write replies.");
/// registry.register_raw("sender", 10, |s| s.is_some(), |s| {
///     format!("The message is from {}.", s.unwrap_or_default())
/// });
///
/// assert_eq!(registry.assemble(&None), "You write replies.");
/// assert!(registry.assemble(&Some("a friend")).ends_with("from a friend."));
/// ```
#[derive(Debug)]
pub struct PromptRegistry<C> {
    preamble: String,
    sections: Vec<PromptSection<C>>,
}

impl<C> PromptRegistry<C> {
    /// Create a registry whose output always starts with `preamble`.
    pub fn new(preamble: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            sections: Vec::new(),
        }
    }

    /// Register a section rendered under a markdown heading.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        heading: impl Into<String>,
        priority: u32,
        condition: impl Fn(&C) -> bool + Send + Sync + 'static,
        content: impl Fn(&C) -> String + Send + Sync + 'static,
    ) {
        self.sections.push(PromptSection {
            name: name.into(),
            heading: heading.into(),
            priority,
            condition: Box::new(condition),
            content: Box::new(content),
        });
        self.sections.sort_by_key(|s| s.priority);
    }

    /// Register a section rendered as a raw paragraph with no heading.
    pub fn register_raw(
        &mut self,
        name: impl Into<String>,
        priority: u32,
        condition: impl Fn(&C) -> bool + Send + Sync + 'static,
        content: impl Fn(&C) -> String + Send + Sync + 'static,
    ) {
        self.register(name, "", priority, condition, content);
    }

    /// Assemble the prompt for `ctx`.
    pub fn assemble(&self, ctx: &C) -> String {
        let mut builder = PromptBuilder::new(self.preamble.as_str());

        for section in self.sections.iter().filter(|s| (s.condition)(ctx)) {
            let content = (section.content)(ctx);
            if section.heading.is_empty() {
                builder = builder.raw(content);
            } else {
                builder = builder.section(&section.heading, content);
            }
        }

        builder.build()
    }

    /// Names of the sections that would be emitted for `ctx`, in order.
    pub fn active_sections(&self, ctx: &C) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| (s.condition)(ctx))
            .map(|s| s.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_returns_preamble_only() {
        let registry = PromptRegistry::<()>::new("You are a helper.");
        assert_eq!(registry.assemble(&()), "You are a helper.");
    }

    #[test]
    fn priority_orders_sections_regardless_of_registration() {
        let mut registry = PromptRegistry::<()>::new("P");
        registry.register_raw("second", 20, |_| true, |_| "second".into());
        registry.register_raw("first", 10, |_| true, |_| "first".into());

        assert_eq!(registry.assemble(&()), "P\n\nfirst\n\nsecond");
        assert_eq!(registry.active_sections(&()), ["first", "second"]);
    }

    #[test]
    fn equal_priority_keeps_registration_order() {
        let mut registry = PromptRegistry::<()>::new("P");
        registry.register_raw("a", 10, |_| true, |_| "a".into());
        registry.register_raw("b", 10, |_| true, |_| "b".into());
        assert_eq!(registry.assemble(&()), "P\n\na\n\nb");
    }

    #[test]
    fn condition_uses_context() {
        let mut registry = PromptRegistry::<u32>::new("P");
        registry.register("count", "Count", 10, |n| *n > 2, |n| format!("n={n}"));

        assert_eq!(registry.assemble(&1), "P");
        assert_eq!(registry.assemble(&3), "P\n\n## Count\n\nn=3");
    }

    #[test]
    fn empty_content_skipped() {
        let mut registry = PromptRegistry::<()>::new("P");
        registry.register("empty", "Empty", 10, |_| true, |_| String::new());
        assert_eq!(registry.assemble(&()), "P");
    }
}
