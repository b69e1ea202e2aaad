mod bridge;
mod cli;

use std::sync::Arc;

use clap::Parser;
use glustervol::{PluginHandler, VolumeDriver};
use tokio::io::BufReader;

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = glustervol::util::init_logging(&cli.log_level);

    let options = cli.to_options()?;

    // The REST client is blocking: build (and drop) the driver outside the
    // async runtime.
    let driver = Arc::new(VolumeDriver::from_options(options)?);
    let handler = Arc::new(PluginHandler::new(Arc::clone(&driver)));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    tracing::info!("Serving volume plugin requests on stdin");
    runtime.block_on(async {
        let input = BufReader::new(tokio::io::stdin());
        bridge::serve(Arc::clone(&handler), input, tokio::io::stdout())
            .await
            .map(|_| ())
    })?;
    drop(runtime);

    tracing::info!(mounted = driver.records().len(), "Input closed, exiting");
    Ok(())
}
