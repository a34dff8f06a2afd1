mod api;
mod cli;
mod poll;
mod render;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
