use std::process;

use clap::Parser;
use parser::Commands;

#[macro_use]
extern crate log;

/// Parse command line arguments and run the requested module.
fn main() {
    let cli = parser::Cli::parse();
    logger::init_logger(&(cli.verbose + u8::from(!cli.quiet)));
    dispatch(cli);
}

fn dispatch(cli: parser::Cli) {
    // ----------------------------- Keep a replayable trace of the invocation.
    if let Err(e) = cli.serialize() {
        warn!("Failed to serialize command line arguments: {e}");
    }

    match &cli.commands {
        Commands::Call{common, call} => {
            if let Err(e) = joint_calling::run(common, call) {
                error!("{e:?}");
                process::exit(1);
            }
        },
        Commands::FromYaml{yaml} => {
            info!("Replaying invocation from {}", yaml.display());
            match parser::Cli::deserialize(yaml) {
                Ok(replayed) => dispatch(replayed),
                Err(e) => {
                    error!("{e:?}");
                    process::exit(1);
                },
            }
        },
    };
}
