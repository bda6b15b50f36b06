use clap::Parser;
use seed_lint::cli::{self, Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate(args) => cli::validate::run(args, cli.config),
        Command::Classify(args) => cli::classify::run(args, cli.config),
    }
}
