mod catalog;
mod cli;
mod infra;
mod lookup;
mod scrape;

use ephy_catalog::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
