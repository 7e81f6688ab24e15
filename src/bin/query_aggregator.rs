use clap::Parser;
use query_aggregator::cli::{commands, Cli, Commands};
use query_aggregator::native::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => commands::execute_init(args)?,
        Commands::Serve(args) => {
            init_tracing();
            commands::execute_serve(args).await?
        }
    }

    Ok(())
}
