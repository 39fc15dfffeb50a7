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

use anyhow::Result;
use chrono_tz::Tz;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use odin_adsb_dist::{adsb::AdsbDistConfig, queue::msg_queue, sbs::SbsFeedClient};

/// prints the position and velocity messages we get from a dump1090 SBS socket
#[derive(Parser, Debug)]
#[command(version, about = "ADS-B SBS socket monitoring tool")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = 30003)]
    port: u16,

    /// timezone of message source (timezone of this host if not set)
    #[arg(long)]
    tz: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let tz: Option<Tz> = match &args.tz {
        Some(name) => Some( name.parse().map_err( |e| anyhow::anyhow!("invalid timezone {}: {}", name, e))?),
        None => None
    };
    let config = AdsbDistConfig { host: args.host, port: args.port, timezone: tz, ..AdsbDistConfig::default() };

    let (tx,rx) = msg_queue();
    let cancel = CancellationToken::new();
    let client = SbsFeedClient::new( &config, tx, cancel.clone());
    let feed_task = tokio::spawn( client.run());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            msg = rx.recv() => match msg {
                Some(msg) => println!("{msg}"),
                None => break
            }
        }
    }

    cancel.cancel();
    feed_task.await??;
    Ok(())
}
