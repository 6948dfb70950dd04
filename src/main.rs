#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cuve_lib::run().await
}
