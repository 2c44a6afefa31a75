mod commands;
mod terminal;

use anyhow::Context;
use commands::{CommandLine, sync};
use invsync_common::config::FileConfig;
use terminal::{logging, print};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init(commands.verbose, commands.log_file.as_deref())?;
    print::banner();

    let file = match &commands.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = commands.into_config(file).context("invalid configuration")?;

    sync::sync(config).await?;
    print::end_of_program();
    Ok(())
}
