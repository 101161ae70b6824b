use anyhow::Result;
use clap::Parser;
use ki_erkenner::cli::{self, Cli};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose);
    cli::run(&cli)
}
