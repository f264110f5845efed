mod dots;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use env_logger::{Builder, Env};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "hicdots";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Find dots (chromatin loops) in Hi-C contact matrices.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug messages"),
        )
        .subcommand(dots::cli::create_call_dots_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    let default_level = if matches.get_flag("verbose") { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match matches.subcommand() {
        //
        // DOT CALLING
        //
        Some((dots::cli::CALL_DOTS_CMD, matches)) => {
            dots::handlers::run_call_dots(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
