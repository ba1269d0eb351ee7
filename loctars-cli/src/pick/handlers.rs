use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use loctars_pick::consts::*;
use loctars_pick::{OutputRequest, PickOptions, pick};
use loctars_scoring::PickConfig;

/// Load the configuration and let the command line override its run options.
fn load_config(matches: &ArgMatches) -> Result<PickConfig> {
    let path = matches
        .get_one::<String>("json-conf")
        .expect("A path to a configuration file is required.");
    let mut config = PickConfig::try_from(Path::new(path))
        .with_context(|| format!("Failed to load the configuration from {}", path))?;

    if let Some(prefix) = matches.get_one::<String>("prefix") {
        config.output_format.id_prefix = prefix.clone();
    }
    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.run_options.threads = *threads;
    }
    if matches.get_flag("purge") {
        config.run_options.purge = true;
    }
    Ok(config)
}

pub fn run_pick(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;

    let input = matches
        .get_one::<String>("input")
        .expect("A path to a transcript file is required.");

    let default_out = DEFAULT_OUTPUT_DIR.to_string();
    let output_dir = matches.get_one::<String>("output-dir").unwrap_or(&default_out);

    let options = PickOptions {
        input: input.clone(),
        output_dir: PathBuf::from(output_dir),
        request: OutputRequest {
            subloci: matches.get_flag("subloci-out"),
            monoloci: matches.get_flag("monoloci-out"),
        },
    };

    let summary = pick(&config, &options)?;
    info!(
        "Picked {} genes from {} superloci into {}",
        summary.genes, summary.superloci, output_dir
    );
    for path in summary.outputs.iter() {
        info!("  {}", path.display());
    }

    Ok(())
}
