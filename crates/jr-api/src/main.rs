#[tokio::main]
async fn main() {
    if let Err(err) = jr_api::run().await {
        tracing::error!(error = %err, "jr-api failed");
        std::process::exit(1);
    }
}
