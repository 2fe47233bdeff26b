use crate::catalog::{run_aliases, run_build, AliasesArgs, BuildArgs};
use crate::infra::bootstrap;
use crate::lookup::{run_lookup, LookupArgs};
use crate::scrape::{run_scrape, ScrapeArgs};
use clap::{Parser, Subcommand};
use ephy_catalog::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "ephy-catalog",
    about = "Build and query the E-Phy product name lookup database",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the compressed product database from the E-Phy CSV export
    Build(BuildArgs),
    /// Generate the secondary-name alias table from the E-Phy CSV export
    Aliases(AliasesArgs),
    /// Scrape product pages for secondary names missing from the export
    Scrape(ScrapeArgs),
    /// Resolve a product by AMM number or by name in a built database
    Lookup(LookupArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = bootstrap()?;

    match cli.command {
        Command::Build(args) => run_build(args, &config),
        Command::Aliases(args) => run_aliases(args, &config),
        Command::Scrape(args) => run_scrape(args, &config),
        Command::Lookup(args) => run_lookup(args),
    }
}
