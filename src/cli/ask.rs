use anyhow::{Result, bail};

use crate::ai::chat::ChatBuilder;
use crate::core::AppConfig;

pub async fn run(config: AppConfig, question: &str) -> Result<()> {
    let chat = ChatBuilder::from_config(&config).build()?;
    let outcome = chat.ask(question).await;
    println!("{}", outcome.reply);
    if let Some(err) = outcome.error {
        bail!(err);
    }
    Ok(())
}
