//! Main entry point for the embedfs CLI app

use embedfs::cli::{self, Commands};
use embedfs::vfs::Assets;

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run_app() {
        if e.downcast_ref::<clap::Error>().is_none() {
            eprintln!("Error: {}", e);
        }
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

fn run_app() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::run()?;
    let assets = Assets::builtin().with_local_root(&args.local_root);
    let mode = args.mode();

    match &args.command {
        Commands::List => cli::list(&assets),
        Commands::Cat { path, mime } => cli::cat(&assets, mode, path, *mime)?,
        Commands::Export { output } => {
            let exported = cli::export(&assets, mode, output)?;
            println!("Exported {} assets to {}", exported, output.display());
        }
    }

    Ok(())
}
