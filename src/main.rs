use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    // Load .env early; ignore if missing.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = ivy_insights::cli::Cli::parse();
    if let Err(err) = ivy_insights::cli::run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("IVY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
