use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::ai::chat::{ChatBuilder, Conversation};
use crate::ai::prompt::SUGGESTED_QUESTIONS;
use crate::core::AppConfig;

#[derive(Debug, PartialEq)]
enum ReplInput {
    Quit,
    Clear,
    Reset,
    Stats,
    Blank,
    Question(String),
}

fn parse_input(line: &str) -> ReplInput {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "" => ReplInput::Blank,
        "quit" | "exit" | "bye" => ReplInput::Quit,
        "/clear" => ReplInput::Clear,
        "/reset" => ReplInput::Reset,
        "/stats" => ReplInput::Stats,
        _ => ReplInput::Question(line.to_string()),
    }
}

fn print_banner(model: &str, key: &str) {
    println!("Amrita College, Coimbatore - AI Chatbot");
    println!("Ask anything about Amrita College! (Type 'quit' to exit)");
    println!("Commands: /clear clears the chat, /reset starts a new session, /stats shows session stats");
    println!("Model: {} | API key: {}", model, key);
    println!("{}", "-".repeat(50));
    println!("Try asking:");
    for q in SUGGESTED_QUESTIONS {
        println!("  - {}", q);
    }
}

pub async fn run(config: AppConfig) -> Result<()> {
    let chat = ChatBuilder::from_config(&config).build()?;
    let mut rl = DefaultEditor::new()?;
    let mut conversation = Conversation::new();

    print_banner(chat.model(), &chat.credential().redacted());
    tracing::info!("Started session {}", conversation.session_id());

    loop {
        let readline = rl.readline("\nYou: ");
        match readline {
            Ok(line) => match parse_input(&line) {
                ReplInput::Blank => continue,
                ReplInput::Quit => {
                    println!("Goodbye!");
                    break;
                }
                ReplInput::Clear => {
                    conversation.clear();
                    println!("Chat cleared.");
                }
                ReplInput::Reset => {
                    conversation.reset();
                    println!("New session started.");
                }
                ReplInput::Stats => {
                    let stats = conversation.stats();
                    println!("Messages sent: {}", stats.messages_sent);
                    println!("AI responses: {}", stats.ai_responses);
                    if stats.total_tokens_used > 0 {
                        println!("Tokens used: {}", stats.total_tokens_used);
                    }
                }
                ReplInput::Question(question) => {
                    if let Err(err) = rl.add_history_entry(question.as_str()) {
                        tracing::debug!("Failed to add history entry: {}", err);
                    }
                    println!("Bot: Thinking...");
                    let outcome = chat.turn(&mut conversation, &question).await;
                    println!("Bot: {}", outcome.reply);
                }
            },
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
