use std::process::ExitCode;

use clap::Parser;
use forward_flows::cli::{self, FindArgs};
use forward_flows::observability::init_logging;

fn main() -> ExitCode {
    let args = FindArgs::parse();
    init_logging(args.verbose);
    let mut stdout = std::io::stdout().lock();
    cli::exit_code(cli::find_forward_flows(&args, &mut stdout))
}
