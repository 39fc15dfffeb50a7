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

//! ADS-B message distribution monitor.
//!
//! Reads SBS position and velocity messages from a dump1090 socket and characterises reception
//! quality by comparing consecutive sightings of the same aircraft. For each (wall clock aligned)
//! window we compute mean and standard deviation of the time between sightings and of the ratio
//! between observed and expected displacement, and write them to a snapshot file that can be
//! picked up by a Munin plugin.

use std::{collections::HashMap, path::Path, time::Duration};
use chrono::{DateTime,TimeDelta,Utc};
use uom::si::{f64::Velocity, length::meter, velocity::meter_per_second};

pub mod errors;
use errors::Result;

pub mod adsb;
use adsb::{AdsbDistConfig, Message, Position};

pub mod sbs;
pub mod queue;
pub mod stats;
pub mod snapshot;
pub mod aggregator;

/// load and validate a RON config file. Missing fields are filled in from `AdsbDistConfig::default()`
pub fn load_config (path: impl AsRef<Path>)->Result<AdsbDistConfig> {
    let data = std::fs::read( path.as_ref())?;
    let config: AdsbDistConfig = ron::de::from_bytes( data.as_slice())?;
    config.validate()?;
    Ok(config)
}

/// answer if `ts` is strictly newer than `now - max_age`. Ages that can't be represented
/// as a date offset count as infinite
pub fn is_within (ts: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration)->bool {
    match TimeDelta::from_std( max_age).ok().and_then( |d| now.checked_sub_signed(d)) {
        Some(cutoff) => ts > cutoff,
        None => true
    }
}

/// the outcome of comparing a new sighting with the previous one of the same aircraft
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Continuity {
    pub time_gap: f64, // seconds
    pub displacement_ratio: Option<f64>, // None if there was no positive expected displacement
}

/// what we remember about an aircraft between messages. Fields are updated independently
#[derive(Debug,Clone,Default,PartialEq)]
pub struct TrackState {
    pub last_position: Option<Position>,
    pub last_timestamp: Option<DateTime<Utc>>, // time of last_position
    pub last_ground_speed: Option<Velocity>,
    pub last_seen: Option<DateTime<Utc>>, // time of the last message of any kind (used for eviction)
}

impl TrackState {

    /// compare a new message against the stored state. This requires a stored position and ground speed,
    /// a stored position that is not older than `stale_after` (relative to `now`) and a position in `msg`
    pub fn continuity (&self, msg: &Message, now: DateTime<Utc>, stale_after: Duration)->Option<Continuity> {
        let (Some(last_pos), Some(last_ts), Some(last_gs), Some(pos)) =
            (&self.last_position, self.last_timestamp, self.last_ground_speed, &msg.position) else { return None };

        if !is_within( last_ts, now, stale_after) { return None }

        let time_gap = (msg.timestamp - last_ts).num_milliseconds() as f64 / 1000.0;

        // distance we would have expected at the last reported speed
        let expected = last_gs.get::<meter_per_second>() * time_gap;
        let displacement_ratio = if expected > 0.0 {
            Some( last_pos.distance_to( pos).get::<meter>() / expected)
        } else {
            None // stationary aircraft or out-of-order timestamps
        };

        Some( Continuity{ time_gap, displacement_ratio })
    }

    pub fn update (&mut self, msg: &Message) {
        if let Some(pos) = msg.position {
            self.last_position = Some(pos);
            self.last_timestamp = Some(msg.timestamp);
        }
        if let Some(gs) = msg.ground_speed {
            self.last_ground_speed = Some(gs);
        }
        self.last_seen = Some(msg.timestamp);
    }
}

/// the per-aircraft memory of the aggregator. Entries are created on first sighting and only
/// go away through `remove_stale`
#[derive(Debug,Default)]
pub struct TrackTable {
    tracks: HashMap<String,TrackState>,
}

impl TrackTable {
    pub fn new ()->Self { TrackTable { tracks: HashMap::new() } }

    pub fn len (&self)->usize { self.tracks.len() }
    pub fn is_empty (&self)->bool { self.tracks.is_empty() }

    pub fn get (&self, icao24: &str)->Option<&TrackState> { self.tracks.get( icao24) }

    /// evaluate continuity of `msg` against the current entry for its aircraft, then update the entry
    /// (creating it if this is the first sighting)
    pub fn process (&mut self, msg: &Message, now: DateTime<Utc>, stale_after: Duration)->Option<Continuity> {
        let track = self.tracks.entry( msg.icao24.clone()).or_default();
        let continuity = track.continuity( msg, now, stale_after);
        track.update( msg);
        continuity
    }

    /// evict all entries we haven't heard from within `drop_after`. Returns number of removed entries
    pub fn remove_stale (&mut self, now: DateTime<Utc>, drop_after: Duration)->usize {
        let n = self.tracks.len();
        self.tracks.retain( |_,track| {
            track.last_seen.map( |ts| is_within( ts, now, drop_after)).unwrap_or(false)
        });
        n - self.tracks.len()
    }
}
