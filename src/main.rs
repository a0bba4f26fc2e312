use anyhow::Context;
use clap::Parser;
use log::{error, info};
use winsol_import::{config, run_import, Cli, InfluxClient};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("Import failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::resolve(&cli).context("resolving configuration")?;

    // One thread: files and chunks are written strictly one after another.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;

    runtime.block_on(async {
        let mut client = InfluxClient::connect(
            &config.server.host,
            config.server.port,
            &config.server.user,
            &config.server.password,
            config.timeout(),
        )
        .await?;
        info!("Successfully connected to influxdb ...");

        let summary = run_import(&mut client, &config).await?;
        summary.log_summary();
        Ok::<(), anyhow::Error>(())
    })
}
