use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    autoflow_cli::cli::app::run().await
}
