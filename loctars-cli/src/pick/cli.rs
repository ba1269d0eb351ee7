use clap::{Arg, ArgAction, Command, arg, value_parser};

pub use loctars_pick::consts::*;

pub fn create_pick_cli() -> Command {
    Command::new(PICK_CMD)
        .about("Pick loci from position-sorted transcripts (JSON lines, optionally gzipped).")
        .arg(
            arg!(--"json-conf" <config>)
                .help("Scoring configuration (.toml, .yaml or .json)")
                .required(true),
        )
        .arg(
            arg!(--input <input>)
                .help("Transcripts, one JSON record per line; '-' reads stdin")
                .required(true),
        )
        .arg(arg!(--"output-dir" <dir>).help("Directory for the merged outputs"))
        .arg(arg!(--prefix <prefix>).help("Prefix of the new gene ids"))
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('t')
                .help("Number of workers")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--purge)
                .help("Drop transcripts that fail the requirements")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"subloci-out")
                .help("Also write the subloci outputs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--"monoloci-out")
                .help("Also write the monosubloci output")
                .action(ArgAction::SetTrue),
        )
}
