use anyhow::Result;
use clap::{Parser, Subcommand};
use komod::input::HitFormat;
use komod::pipeline::{self, DetectArgs};

#[derive(Parser)]
#[command(name = "komod")]
#[command(version = "0.1.0")]
#[command(about = "KO detection and KEGG module completion scoring from search tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a BATH summary table (.tbl)
    Tbl(DetectArgs),

    /// Process a HMMER3 per-domain table (.domtblout)
    Domtblout(DetectArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Tbl(args) => {
            pipeline::run(HitFormat::Tbl, &args)?;
        }
        Commands::Domtblout(args) => {
            pipeline::run(HitFormat::Domtblout, &args)?;
        }
    }
    Ok(())
}
