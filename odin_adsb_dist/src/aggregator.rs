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

use std::time::Duration;
use chrono::{DateTime,Utc};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, error};

use crate::{TrackTable, adsb::{AdsbDistConfig, Message}, queue::MsgReceiver, snapshot::SnapshotStore, stats::{DeltaSamples, Snapshot}};

/// time from `now` until the next multiple of `window` (counted from the epoch)
pub fn time_to_next_boundary (now: DateTime<Utc>, window: Duration)->Duration {
    let period = (window.as_millis() as i64).max(1);
    let rem = now.timestamp_millis().rem_euclid( period);
    Duration::from_millis( (period - rem) as u64)
}

/// owns all per-window state and the track table. Everything in here is only touched by the
/// task that runs the aggregator, the feed client only shares the message queue
pub struct Aggregator {
    window: Duration,
    stale_after: Duration,
    drop_after: Duration,

    tracks: TrackTable,
    samples: DeltaSamples,
    store: SnapshotStore,
}

impl Aggregator {
    pub fn new (config: &AdsbDistConfig)->Self {
        Aggregator {
            window: config.window,
            stale_after: config.stale_after,
            drop_after: config.drop_after,
            tracks: TrackTable::new(),
            samples: DeltaSamples::new(),
            store: SnapshotStore::new( config.stats_file.clone()),
        }
    }

    pub fn tracks (&self)->&TrackTable { &self.tracks }
    pub fn samples (&self)->&DeltaSamples { &self.samples }
    pub fn store (&self)->&SnapshotStore { &self.store }

    /// check continuity of `msg` and then update the track state for its aircraft
    pub fn process (&mut self, msg: &Message, now: DateTime<Utc>) {
        if let Some(continuity) = self.tracks.process( msg, now, self.stale_after) {
            self.samples.record( &continuity);
        }
    }

    /// process messages in the given order. Returns the number of processed messages
    pub fn process_batch (&mut self, msgs: impl IntoIterator<Item=Message>, now: DateTime<Utc>)->usize {
        let mut n = 0;
        for msg in msgs {
            self.process( &msg, now);
            n += 1;
        }
        n
    }

    /// reduce the samples of this window, persist the result and evict tracks we haven't heard from
    /// in a long time. A failed write is logged, the previous snapshot file stays in place
    pub fn complete_window (&mut self, now: DateTime<Utc>)->Snapshot {
        let snapshot = self.samples.take_snapshot();

        if let Err(e) = self.store.write( &snapshot) {
            error!("failed to write stats to {:?}: {}", self.store.path(), e);
        }

        let n_dropped = self.tracks.remove_stale( now, self.drop_after);
        info!("window {}: {}, tracks: {} (dropped {})", now.format("%H:%M:%S"), snapshot, self.tracks.len(), n_dropped);

        snapshot
    }

    /// the aggregator loop. Wakes up at window boundaries, processes whatever is queued at that time
    /// and completes the window. Runs until cancelled
    pub async fn run (mut self, queue: MsgReceiver, cancel: CancellationToken) {
        info!("aggregator started with {}s window", self.window.as_secs());

        loop {
            let delay = time_to_next_boundary( Utc::now(), self.window);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep( delay) => {}
            }

            let now = Utc::now();
            let n = self.process_batch( queue.drain_pending(), now);
            debug!("processed {} messages", n);

            self.complete_window( now);
        }

        info!("aggregator terminated");
    }
}
