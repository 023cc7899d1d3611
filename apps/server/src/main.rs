#[tokio::main]
async fn main() -> anyhow::Result<()> {
    matchdeck_server::run().await
}
