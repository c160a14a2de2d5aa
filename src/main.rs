use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = edgeip::cli::Cli::parse();
    if let Err(e) = edgeip::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
