#[tokio::main]
async fn main() -> anyhow::Result<()> {
    api_relay_lib::run().await
}
