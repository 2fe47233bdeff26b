use crate::catalog::render_product;
use clap::{ArgGroup, Args};
use ephy_catalog::catalog::{CatalogIndex, ProductRecord};
use ephy_catalog::database::ProductDatabase;
use ephy_catalog::error::AppError;
use std::path::PathBuf;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("query").required(true).args(["id", "name"])))]
pub(crate) struct LookupArgs {
    /// Product database produced by `build`
    #[arg(long)]
    pub(crate) database: PathBuf,
    /// Exact AMM number
    #[arg(long)]
    pub(crate) id: Option<String>,
    /// Primary or secondary commercial name, matched after normalization
    #[arg(long)]
    pub(crate) name: Option<String>,
}

pub(crate) fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let index = ProductDatabase::load(&args.database)?.to_index();
    print!("{}", render_matches(&index, &args));
    Ok(())
}

fn render_matches(index: &CatalogIndex, args: &LookupArgs) -> String {
    let (query, matches): (String, Vec<&ProductRecord>) = match (&args.id, &args.name) {
        (Some(id), _) => (format!("AMM {id}"), index.resolve_by_id(id).into_iter().collect()),
        (None, Some(name)) => (format!("name \"{name}\""), index.resolve_by_name(name)),
        (None, None) => (String::from("nothing"), Vec::new()),
    };

    if matches.is_empty() {
        return format!("No product matches {query}\n");
    }

    let mut out = format!("{} product(s) match {query}\n", matches.len());
    for product in matches {
        out.push('\n');
        out.push_str(&render_product(product));
    }
    out
}
