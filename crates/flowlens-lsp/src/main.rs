#[tokio::main]
async fn main() -> eyre::Result<()> {
    flowlens_lsp::run().await
}
