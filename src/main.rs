use clap::Parser;
use tradesight::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
