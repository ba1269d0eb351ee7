mod pick;

use anyhow::Result;
use clap::Command;
use env_logger::Env;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "loctars";
    pub const BIN_NAME: &str = "loctars";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Decompose transcript superloci into scored, non-overlapping gene loci.")
        .subcommand_required(true)
        .subcommand(pick::cli::create_pick_cli())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // PICK
        //
        Some((pick::cli::PICK_CMD, matches)) => {
            pick::handlers::run_pick(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
