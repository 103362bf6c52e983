use clap::Parser;
use pagesnap::{setup_logging, CaptureService, Cli};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    setup_logging(args.verbose);

    info!("Starting pagesnap v{}", env!("CARGO_PKG_VERSION"));

    let config = args.to_config();
    let request = args.to_request();

    let service = CaptureService::new(config);
    let result = service.capture(&request).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.success {
        std::process::exit(1);
    }

    Ok(())
}
