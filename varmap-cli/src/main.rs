mod cli;
mod handlers;

use anyhow::Result;
use clap::Command;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "varmap";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Retrieve human genomic variants by biological identifier or annotation filter, with protein-level consequences.")
        .subcommand_required(true)
        .subcommand(cli::create_search_cli())
        .subcommand(cli::create_export_cli())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env().init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // INTERACTIVE SEARCH
        //
        Some((cli::SEARCH_CMD, matches)) => {
            handlers::run_search(matches)?;
        }

        //
        // UNBOUNDED EXPORT
        //
        Some((cli::EXPORT_CMD, matches)) => {
            handlers::run_export(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
