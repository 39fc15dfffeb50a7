/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;
use odin_adsb_dist::{
    load_config, adsb::AdsbDistConfig, aggregator::Aggregator, errors::OdinAdsbDistError,
    queue::msg_queue, sbs::SbsFeedClient, snapshot::{MUNIN_CONFIG, read_snapshot}
};

#[derive(Parser, Debug)]
#[command(version, about = "ADS-B message distribution monitor", long_about = "collects continuity statistics from a dump1090 SBS socket and reports them as Munin plugin")]
struct Args {
    /// RON config file (built-in defaults if not set)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// run the collector in the foreground
    Run,
    /// print the Munin graph definition
    Config,
    /// print the last snapshot in Munin format (default)
    Fetch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config( path)?,
        None => AdsbDistConfig::default()
    };

    match args.cmd.unwrap_or(Cmd::Fetch) {
        Cmd::Run => run_collector( config).await,
        Cmd::Config => {
            print!("{MUNIN_CONFIG}");
            Ok(())
        }
        Cmd::Fetch => match read_snapshot( &config.stats_file) {
            Ok(snapshot) => {
                print!("{}", snapshot.to_munin_string());
                Ok(())
            }
            Err(OdinAdsbDistError::SnapshotMissing(path)) => {
                println!("stats file {} missing", path.display());
                std::process::exit(1)
            }
            Err(e) => Err(e.into())
        }
    }
}

async fn run_collector (config: AdsbDistConfig)->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info")))  // use RUST_LOG to set max level
        .init();

    info!("collecting from {} (timezone {}) into {:?}", config.feed_addr(), config.timezone_name(), config.stats_file);

    let (tx,rx) = msg_queue();
    let cancel = CancellationToken::new();

    let feed_task = tokio::spawn( SbsFeedClient::new( &config, tx, cancel.clone()).run());
    let aggregator_task = tokio::spawn( Aggregator::new( &config).run( rx, cancel.clone()));

    shutdown_signal().await?;
    info!("shutting down");
    cancel.cancel();

    if let Err(e) = feed_task.await? {
        error!("feed client failed: {e}");
    }
    aggregator_task.await?;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal ()->Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal( SignalKind::terminate())?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => res?,
        _ = term.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal ()->Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
