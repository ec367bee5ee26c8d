//! Reply request and response model, with boundary validation.
//!
//! Every optional context field is a closed enum. [`ReplyRequest::validate`]
//! checks a raw JSON body against the request's JSON Schema and either yields
//! a typed request or an [`InputDiagnostics`] listing every problem it found,
//! keyed by field name. Unknown keys are ignored.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::paths::LocationSegment;
use jsonschema::{ValidationError, Validator};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::json_schema_for;

/// Maximum accepted length of the incoming message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Maximum accepted length of the free-text context, in characters.
pub const MAX_CONTEXT_CHARS: usize = 1000;

// ── Field enums ────────────────────────────────────────────────────

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[serde(rename_all = "camelCase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// The camelCase wire value.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum! {
    /// Output register. `Hi` means Hinglish written in the Latin alphabet.
    Language { En => "en", Hi => "hi" }
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

choice_enum! {
    /// Desired tone of the suggestions.
    Tone {
        Funny => "funny",
        Flirty => "flirty",
        Savage => "savage",
        Sweet => "sweet",
        Sarcastic => "sarcastic",
        Formal => "formal",
    }
}

choice_enum! {
    /// When the incoming message arrived.
    Timing {
        Morning => "morning",
        Afternoon => "afternoon",
        Evening => "evening",
        LateNight => "lateNight",
    }
}

choice_enum! {
    /// Who sent the incoming message.
    SenderType {
        Friend => "friend",
        Crush => "crush",
        Ex => "ex",
        Parent => "parent",
        Stranger => "stranger",
        Boss => "boss",
    }
}

choice_enum! {
    /// The user's current relationship with the sender.
    RelationshipVibe {
        JustMet => "justMet",
        Complicated => "complicated",
        OldFlame => "oldFlame",
        GhostedMe => "ghostedMe",
        CloseFriend => "closeFriend",
        WorkMode => "workMode",
    }
}

choice_enum! {
    /// How the user feels right now.
    Mood {
        Happy => "happy",
        Annoyed => "annoyed",
        Confused => "confused",
        Nervous => "nervous",
        Heartbroken => "heartbroken",
        Neutral => "neutral",
    }
}

choice_enum! {
    /// What the user wants the reply to achieve.
    Goal {
        Impress => "impress",
        Tease => "tease",
        Comfort => "comfort",
        EndConversation => "endConversation",
        RestartVibe => "restartVibe",
    }
}

// ── Request / response ─────────────────────────────────────────────

// Optional enum fields take the bare enum schema so an explicit `null` is
// rejected rather than treated as absent.

/// A validated request for reply suggestions.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    /// The incoming text message to generate replies for.
    #[schemars(length(max = 4000))]
    pub message: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Tone")]
    pub tone: Option<Tone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Timing")]
    pub timing: Option<Timing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "SenderType")]
    pub sender_type: Option<SenderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "RelationshipVibe")]
    pub relationship_vibe: Option<RelationshipVibe>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Mood")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Goal")]
    pub goal: Option<Goal>,
    /// Free-text context about the situation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "String", length(max = 1000))]
    pub additional_context: Option<String>,
}

/// Reply suggestions returned by the generation service.
#[derive(Serialize, Deserialize, JsonSchema, Clone, Debug, PartialEq, Eq)]
pub struct ReplyResponse {
    /// Distinct, short reply suggestions for the incoming message.
    pub replies: Vec<String>,
}

static REQUEST_VALIDATOR: LazyLock<Option<Validator>> = LazyLock::new(|| {
    jsonschema::validator_for(&json_schema_for::<ReplyRequest>())
        .inspect_err(|e| warn!("Request schema failed to compile: {e}"))
        .ok()
});

impl ReplyRequest {
    /// A request with only the message set and every optional field absent.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            language: Language::default(),
            tone: None,
            timing: None,
            sender_type: None,
            relationship_vibe: None,
            mood: None,
            goal: None,
            additional_context: None,
        }
    }

    /// Parse and validate a raw request body.
    pub fn from_json_slice(body: &[u8]) -> Result<Self, InputDiagnostics> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| InputDiagnostics::form(format!("Malformed JSON body: {e}")))?;
        Self::validate(&value)
    }

    /// Validate an already-parsed JSON value against the request schema.
    ///
    /// Collects every field problem rather than stopping at the first.
    pub fn validate(raw: &Value) -> Result<Self, InputDiagnostics> {
        let mut diag = InputDiagnostics::default();

        if let Some(validator) = REQUEST_VALIDATOR.as_ref() {
            let mut problems: Vec<Problem> = validator.iter_errors(raw).map(Problem::from).collect();
            // A wrong type makes every other complaint about that field noise.
            let mistyped: BTreeSet<Option<String>> = problems
                .iter()
                .filter(|p| p.mistyped)
                .map(|p| p.field.clone())
                .collect();
            problems.retain(|p| p.mistyped || !mistyped.contains(&p.field));

            for problem in problems {
                match problem.field {
                    Some(field) => diag.push_field(&field, problem.message),
                    None => diag.form_errors.push(problem.message),
                }
            }
        }

        // Whitespace-only text satisfies the schema but carries nothing.
        if let Some(message) = raw.get("message").and_then(Value::as_str)
            && message.trim().is_empty()
            && diag.field_messages("message").is_empty()
        {
            diag.push_field("message", "Message cannot be empty.");
        }

        if !diag.is_empty() {
            return Err(diag);
        }
        serde_json::from_value(raw.clone()).map_err(|e| InputDiagnostics::form(e.to_string()))
    }

    /// The free-text context, if it carries anything besides whitespace.
    pub fn context_text(&self) -> Option<&str> {
        self.additional_context
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One schema violation, attributed to a top-level field or to the body.
struct Problem {
    field: Option<String>,
    message: String,
    mistyped: bool,
}

impl From<ValidationError<'_>> for Problem {
    fn from(err: ValidationError<'_>) -> Self {
        let field = match err.instance_path().iter().next() {
            Some(LocationSegment::Property(name)) => Some(name.into_owned()),
            Some(LocationSegment::Index(i)) => Some(i.to_string()),
            None => None,
        };
        let instance = err.instance();

        let (field, message) = match (field, err.kind()) {
            (None, ValidationErrorKind::Required { property }) => (
                Some(property.as_str().map_or_else(|| property.to_string(), String::from)),
                "Required".to_string(),
            ),
            (field, ValidationErrorKind::Type { kind: TypeKind::Single(expected) }) => (
                field,
                format!("Expected {expected}, received {}", json_type(instance)),
            ),
            (Some(field), ValidationErrorKind::Enum { options }) => {
                let message = format!(
                    "Invalid enum value. Expected {}, received {}",
                    quoted_options(options),
                    quoted(instance)
                );
                (Some(field), message)
            }
            (Some(field), ValidationErrorKind::MaxLength { limit }) => {
                let message = if field == "message" {
                    format!("Message must be at most {limit} characters.")
                } else {
                    format!("Must be at most {limit} characters.")
                };
                (Some(field), message)
            }
            (field, _) => (field, err.to_string()),
        };

        Self {
            field,
            message,
            mistyped: matches!(err.kind(), ValidationErrorKind::Type { .. }),
        }
    }
}

fn quoted(value: &Value) -> String {
    match value.as_str() {
        Some(text) => format!("'{text}'"),
        None => value.to_string(),
    }
}

fn quoted_options(options: &Value) -> String {
    match options.as_array() {
        Some(items) => items.iter().map(quoted).collect::<Vec<_>>().join(" | "),
        None => options.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Diagnostics ────────────────────────────────────────────────────

/// Field-level validation diagnostics returned to the caller on bad input.
///
/// Serializes as `{"formErrors": [...], "fieldErrors": {"field": [...]}}`.
/// Fields are kept sorted so the output is stable.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InputDiagnostics {
    pub form_errors: Vec<String>,
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl InputDiagnostics {
    /// Diagnostics holding a single error about the body as a whole.
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            form_errors: vec![message.into()],
            field_errors: BTreeMap::new(),
        }
    }

    pub fn push_field(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded against `field`, empty if none.
    pub fn field_messages(&self, field: &str) -> &[String] {
        self.field_errors.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.is_empty()
    }
}

impl fmt::Display for InputDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.form_errors.clone();
        for (field, messages) in &self.field_errors {
            parts.extend(messages.iter().map(|m| format!("{field}: {m}")));
        }
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for InputDiagnostics {}
