use std::process::ExitCode;

use storefront_client::frameworks::cli;

#[tokio::main]
async fn main() -> ExitCode {
    cli::run().await
}
