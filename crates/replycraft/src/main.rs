//! Preview reply suggestions from the command line.
//!
//! Builds the same prompt the gateway builds and either prints it or sends
//! it to OpenRouter. Reads the API key from `OPENROUTER_KEY`.
//!
//! # Examples
//!
//! ```sh
//! # Inspect the prompt without calling the model
//! replycraft --message "hey what's up" --tone funny --print-prompt
//!
//! # Hinglish replies to an ex who ghosted
//! replycraft --message "long time no see" --language hi \
//!   --sender-type ex --relationship-vibe ghostedMe
//!
//! # Pipe the message from stdin
//! pbpaste | replycraft --stdin --goal tease
//! ```

use std::io::{self, Read};
use std::process;

use clap::Parser;
use replycraft::prelude::*;
use serde_json::{Map, Value};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Suggest replies to a text message.
///
/// Reads the API key from the OPENROUTER_KEY environment variable.
#[derive(Parser)]
#[command(name = "replycraft")]
struct Cli {
    // ── Message ────────────────────────────────────────────────
    /// The message you received
    #[arg(long)]
    message: Option<String>,

    /// Read the message from stdin
    #[arg(long)]
    stdin: bool,

    // ── Context ────────────────────────────────────────────────
    /// Reply language: en or hi (Hinglish)
    #[arg(long)]
    language: Option<String>,

    /// funny, flirty, savage, sweet, sarcastic, formal
    #[arg(long)]
    tone: Option<String>,

    /// When the message arrived: morning, afternoon, evening, lateNight
    #[arg(long)]
    timing: Option<String>,

    /// Who sent it: friend, crush, ex, parent, stranger, boss
    #[arg(long)]
    sender_type: Option<String>,

    /// Relationship state: justMet, complicated, oldFlame, ghostedMe, closeFriend, workMode
    #[arg(long)]
    relationship_vibe: Option<String>,

    /// Your mood: happy, annoyed, confused, nervous, heartbroken, neutral
    #[arg(long)]
    mood: Option<String>,

    /// What you want: impress, tease, comfort, endConversation, restartVibe
    #[arg(long)]
    goal: Option<String>,

    /// Free-text background for the conversation
    #[arg(long)]
    context: Option<String>,

    // ── Model ──────────────────────────────────────────────────
    #[arg(long, env = "REPLYCRAFT_MODEL", default_value = replycraft::DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature
    #[arg(long, default_value_t = 0.9)]
    temperature: f32,

    #[arg(long, default_value_t = 512)]
    max_tokens: u32,

    // ── Output ─────────────────────────────────────────────────
    /// Print the rendered prompt and exit without calling the model
    #[arg(long)]
    print_prompt: bool,

    /// Print the replies as JSON
    #[arg(long)]
    json: bool,

    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: Level,
}

/// Build the JSON body the gateway would receive, so the CLI shares its
/// validation.
fn request_body(cli: &Cli, message: String) -> Value {
    let mut body = Map::new();
    body.insert("message".into(), Value::String(message));

    let optional = [
        ("language", &cli.language),
        ("tone", &cli.tone),
        ("timing", &cli.timing),
        ("senderType", &cli.sender_type),
        ("relationshipVibe", &cli.relationship_vibe),
        ("mood", &cli.mood),
        ("goal", &cli.goal),
        ("additionalContext", &cli.context),
    ];
    for (key, value) in optional {
        if let Some(v) = value {
            body.insert(key.into(), Value::String(v.clone()));
        }
    }
    Value::Object(body)
}

fn read_message(cli: &Cli) -> Result<String, String> {
    let piped = if cli.stdin {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        Some(buf)
    } else {
        None
    };

    match (&cli.message, piped) {
        (Some(msg), Some(piped)) => Ok(format!("{msg}\n{piped}")),
        (Some(msg), None) => Ok(msg.clone()),
        (None, Some(piped)) => Ok(piped),
        (None, None) => Err("provide --message, --stdin, or both".to_string()),
    }
}

async fn run(cli: &Cli) -> Result<String, String> {
    let message = read_message(cli)?;
    let request = ReplyRequest::validate(&request_body(cli, message))
        .map_err(|d| format!("invalid input: {d}"))?;
    let prompt = ReplyPrompt::new().render(&request);

    if cli.print_prompt {
        return Ok(format!("{}\n", prompt.text));
    }

    let api_key = std::env::var("OPENROUTER_KEY")
        .map_err(|_| "OPENROUTER_KEY environment variable is not set".to_string())?;
    let client = OpenRouterClient::new(api_key).map_err(|e| e.to_string())?;
    let generator = OpenRouterGenerator::new(
        client,
        GeneratorConfig {
            model: cli.model.clone(),
            max_tokens: cli.max_tokens,
            temperature: cli.temperature,
        },
    );

    let response = generator.generate(&prompt).await.map_err(|e| e.to_string())?;

    if cli.json {
        return serde_json::to_string_pretty(&response)
            .map(|s| format!("{s}\n"))
            .map_err(|e| format!("failed to serialize replies: {e}"));
    }

    Ok(response
        .replies
        .iter()
        .enumerate()
        .map(|(i, reply)| format!("{}. {reply}\n", i + 1))
        .collect())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(LevelFilter::from_level(cli.log_level))
        .init();

    match run(&cli).await {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
