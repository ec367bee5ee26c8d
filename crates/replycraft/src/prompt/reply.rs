//! The reply-suggestion prompt.
//!
//! [`ReplyPrompt`] renders a [`ReplyRequest`] into the instruction text sent
//! to the generation service, plus the JSON Schema its answer must satisfy.
//! Sections are registered once with fixed priorities:
//!
//! | priority | section | present when |
//! |---|---|---|
//! | 0 | persona and output shape | always |
//! | 10 | quoted incoming message | always |
//! | 20..=70 | sender, vibe, timing, mood, goal, free-text context | field is set |
//! | 80 | relationship dynamics | a special combination matches |
//! | 90 | tone guidance | always (generic guidance without a tone) |
//! | 100 | language directive | always |
//!
//! Rendering is pure: identical requests produce byte-identical prompts.

use serde_json::Value;

use super::registry::PromptRegistry;
use crate::json_schema_for;
use crate::request::{
    Goal, Language, Mood, RelationshipVibe, ReplyRequest, ReplyResponse, SenderType, Timing, Tone,
};

/// Name under which the output schema is declared to the generation service.
pub const OUTPUT_SCHEMA_NAME: &str = "reply_suggestions";

const PERSONA: &str = "\
You are ReplyCraft, an expert in crafting witty, context-aware, and emotionally \
intelligent text message replies. Suggest 3 to 5 distinct replies the user could \
send back. Each reply must be under 20 words, sound like a real person texting, \
and stand on its own. Answer with a JSON object of the form \
{\"replies\": [\"...\", \"...\"]} and nothing else.";

const DEFAULT_TONE: &str = "\
The user has not picked a tone. Aim for a generally witty and engaging tone that \
fits the situation.";

const HINGLISH_DIRECTIVE: &str = "\
MANDATORY: write every reply in Hinglish, the natural mix of Hindi and English that \
people use when texting casually in India. Write it ONLY in the Latin (English) \
alphabet: transliterate every Hindi word into Latin letters, for example \
\"kya scene hai\", \"bas chill kar raha hu\", \"tension mat le yaar\". NEVER use \
Devanagari script or any other Hindi-only script. Do NOT fall back to plain English: \
every single reply must mix in Hindi words. A reply written in plain English or in \
Devanagari is wrong.";

const ENGLISH_DIRECTIVE: &str = "Write every reply in natural, conversational English.";

/// A rendered prompt: the instruction text and the declared output contract.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPrompt {
    pub text: String,
    /// JSON Schema of [`ReplyResponse`].
    pub output_schema: Value,
}

/// Renders reply requests into prompts.
///
/// Build once and share; rendering takes `&self`.
#[derive(Debug)]
pub struct ReplyPrompt {
    registry: PromptRegistry<ReplyRequest>,
    output_schema: Value,
}

impl Default for ReplyPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyPrompt {
    pub fn new() -> Self {
        Self {
            registry: reply_prompt_registry(),
            output_schema: json_schema_for::<ReplyResponse>(),
        }
    }

    /// Render `request`. Never fails; field values are assumed validated.
    pub fn render(&self, request: &ReplyRequest) -> RenderedPrompt {
        RenderedPrompt {
            text: self.registry.assemble(request),
            output_schema: self.output_schema.clone(),
        }
    }

    /// Section names that `request` activates, in prompt order.
    pub fn active_sections(&self, request: &ReplyRequest) -> Vec<&str> {
        self.registry.active_sections(request)
    }

    pub fn output_schema(&self) -> &Value {
        &self.output_schema
    }
}

/// Build the registry behind [`ReplyPrompt`].
pub fn reply_prompt_registry() -> PromptRegistry<ReplyRequest> {
    let mut registry = PromptRegistry::<ReplyRequest>::new(PERSONA);

    registry.register_raw(
        "message",
        10,
        |_| true,
        |r| {
            format!(
                "The user received this message, quoted exactly:\n\"\"\"\n{}\n\"\"\"",
                r.message
            )
        },
    );
    registry.register_raw(
        "sender",
        20,
        |r| r.sender_type.is_some(),
        |r| {
            r.sender_type
                .map(|s| format!("The message is from {}.", sender_phrase(s)))
                .unwrap_or_default()
        },
    );
    registry.register_raw(
        "vibe",
        30,
        |r| r.relationship_vibe.is_some(),
        |r| {
            r.relationship_vibe
                .map(|v| format!("Relationship vibe: {}.", vibe_phrase(v)))
                .unwrap_or_default()
        },
    );
    registry.register_raw(
        "timing",
        40,
        |r| r.timing.is_some(),
        |r| {
            r.timing
                .map(|t| format!("The message arrived {}.", timing_phrase(t)))
                .unwrap_or_default()
        },
    );
    registry.register_raw(
        "mood",
        50,
        |r| r.mood.is_some(),
        |r| {
            r.mood
                .map(|m| format!("Right now the user is feeling {}.", mood_phrase(m)))
                .unwrap_or_default()
        },
    );
    registry.register_raw(
        "goal",
        60,
        |r| r.goal.is_some(),
        |r| {
            r.goal
                .map(|g| format!("With this reply the user wants to {}.", goal_phrase(g)))
                .unwrap_or_default()
        },
    );
    registry.register_raw(
        "context",
        70,
        |r| r.context_text().is_some(),
        |r| {
            r.context_text()
                .map(|c| format!("Additional context from the user: \"{c}\""))
                .unwrap_or_default()
        },
    );
    registry.register(
        "dynamics",
        "Relationship dynamics",
        80,
        |r| !dynamics_notes(r).is_empty(),
        |r| dynamics_notes(r).join("\n"),
    );
    registry.register("tone", "Tone", 90, |_| true, |r| tone_guidance(r.tone));
    registry.register(
        "language",
        "Language",
        100,
        |_| true,
        |r| match r.language {
            Language::En => ENGLISH_DIRECTIVE.to_string(),
            Language::Hi => HINGLISH_DIRECTIVE.to_string(),
        },
    );

    registry
}

fn sender_phrase(sender: SenderType) -> &'static str {
    match sender {
        SenderType::Friend => "a friend",
        SenderType::Crush => "the user's crush",
        SenderType::Ex => "the user's ex",
        SenderType::Parent => "the user's parent",
        SenderType::Stranger => "a stranger",
        SenderType::Boss => "the user's boss",
    }
}

fn vibe_phrase(vibe: RelationshipVibe) -> &'static str {
    match vibe {
        RelationshipVibe::JustMet => "they only just met",
        RelationshipVibe::Complicated => "it's complicated",
        RelationshipVibe::OldFlame => "an old flame, there is history here",
        RelationshipVibe::GhostedMe => "this person ghosted the user before",
        RelationshipVibe::CloseFriend => "close friends who can be completely honest",
        RelationshipVibe::WorkMode => "strictly work, keep it professional",
    }
}

fn timing_phrase(timing: Timing) -> &'static str {
    match timing {
        Timing::Morning => "in the morning",
        Timing::Afternoon => "in the afternoon",
        Timing::Evening => "in the evening",
        Timing::LateNight => "late at night",
    }
}

fn mood_phrase(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "happy",
        Mood::Annoyed => "annoyed",
        Mood::Confused => "confused",
        Mood::Nervous => "nervous",
        Mood::Heartbroken => "heartbroken",
        Mood::Neutral => "neutral",
    }
}

fn goal_phrase(goal: Goal) -> &'static str {
    match goal {
        Goal::Impress => "impress the sender",
        Goal::Tease => "playfully tease the sender",
        Goal::Comfort => "comfort the sender",
        Goal::EndConversation => "politely wind the conversation down",
        Goal::RestartVibe => "restart the vibe and get the conversation flowing again",
    }
}

/// Notes for sender/vibe/tone combinations that need more than the plain clauses.
fn dynamics_notes(r: &ReplyRequest) -> Vec<&'static str> {
    let mut notes = Vec::new();
    if r.sender_type == Some(SenderType::Ex)
        && r.relationship_vibe == Some(RelationshipVibe::GhostedMe)
    {
        notes.push(
            "The ex who ghosted the user is reaching out again. Replies should show the \
             user has moved on and holds the upper hand: unbothered, never needy or bitter.",
        );
    }
    if r.sender_type == Some(SenderType::Crush)
        && r.relationship_vibe == Some(RelationshipVibe::JustMet)
        && r.tone == Some(Tone::Flirty)
    {
        notes.push(
            "This is a brand-new crush. Keep the flirting light and curious, leave room \
             for them to respond, and do not come on too strong.",
        );
    }
    if r.sender_type == Some(SenderType::Parent) && r.tone == Some(Tone::Funny) {
        notes.push(
            "This is a parent. Keep the humour warm, wholesome, and family-friendly: \
             gentle teasing is fine, innuendo is not.",
        );
    }
    notes
}

fn tone_guidance(tone: Option<Tone>) -> String {
    let Some(tone) = tone else {
        return DEFAULT_TONE.to_string();
    };
    let guidance = match tone {
        Tone::Funny => {
            "Aim for humour and light-heartedness. For example, to 'I'm so tired' a funny \
             reply could be 'Hi So Tired, I'm ReplyCraft! Wanna nap together?'"
        }
        Tone::Flirty => {
            "Be playful, charming, and a little suggestive. For example, to 'Thinking of \
             you' a flirty reply could be 'Oh really? And what kind of thoughts are those? 😉'"
        }
        Tone::Savage => {
            "Be direct, sharp, and cleverly cutting. For example, to an unwanted 'u up?' a \
             savage reply could be 'For you? My standards are higher than my heels.'"
        }
        Tone::Sweet => {
            "Be kind, affectionate, and gentle. For example, to 'Had a bad day' a sweet \
             reply could be 'Oh no! Sending you a virtual hug and hoping tomorrow is much \
             brighter for you. 🤗'"
        }
        Tone::Sarcastic => {
            "Use irony or mock sincerity to say the opposite of what is literally meant. \
             For example, to excessive bragging a sarcastic reply could be 'Wow, I'm SO \
             impressed. Tell me more about your incredibly fascinating life.'"
        }
        Tone::Formal => {
            "Be polite, respectful, and use proper, professional language. For example, to \
             an inquiry a formal reply could be 'Thank you for your message. I will look \
             into this and respond at my earliest convenience.'"
        }
    };
    format!("The user wants a {tone} tone. {guidance}")
}
