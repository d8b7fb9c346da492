use anyhow::Result;
use campus::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
