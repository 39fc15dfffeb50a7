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

use std::{fmt, path::PathBuf, time::Duration};
use chrono::{DateTime,Utc};
use chrono_tz::Tz;
use serde::{Serialize,Deserialize};
use geo::{Distance, Geodesic, Point};
use crate::errors::{Result, OdinAdsbDistError};
use uom::si::{f64::{Length,Velocity}, length::{foot,meter}, velocity::knot};

/// configuration of the message distribution collector, normally loaded from a RON file.
/// All fields have defaults so that config files only need to mention what differs
#[derive(Deserialize,Serialize,Debug,Clone)]
#[serde(default)]
pub struct AdsbDistConfig {
    pub host: String,  // of the SBS socket (dump1090 port 30003)
    pub port: u16,
    pub timezone: Option<Tz>, // dump1090 reports local receiver time. None means the timezone of this host
    pub window: Duration, // length of the (wall clock aligned) statistics window
    pub stale_after: Duration, // prior sightings older than this are not compared
    pub drop_after: Duration, // track entries older than this get evicted
    pub stats_file: PathBuf, // where the snapshot of the last window is written to
    pub connect_retry: Duration, // delay between failed connection attempts
    pub reconnect_pause: Duration, // pause after a connection broke down mid-stream
}

impl Default for AdsbDistConfig {
    fn default()->Self {
        AdsbDistConfig {
            host: "127.0.0.1".to_string(),
            port: 30003,
            timezone: None,
            window: Duration::from_secs(300),
            stale_after: Duration::from_secs(600),
            drop_after: Duration::from_secs(1800),
            stats_file: PathBuf::from("/var/run/adsb-msg-dist.dat"),
            connect_retry: Duration::from_secs(5),
            reconnect_pause: Duration::from_secs(2),
        }
    }
}

impl AdsbDistConfig {
    pub fn feed_addr (&self)->String { format!("{}:{}", self.host, self.port) }

    pub fn timezone_name (&self)->String {
        self.timezone.map( |tz| tz.name().to_string()).unwrap_or_else( || "local".to_string())
    }

    /// reject settings the aggregator can't work with. Tracks have to outlive the staleness bound,
    /// otherwise we would evict entries that are still valid for comparison
    pub fn validate (&self)->Result<()> {
        if self.window.is_zero() {
            return Err( OdinAdsbDistError::InvalidConfig("window must not be zero".into()))
        }
        if self.drop_after <= self.stale_after {
            return Err( OdinAdsbDistError::InvalidConfig(
                format!("drop_after ({}s) has to be larger than stale_after ({}s)", self.drop_after.as_secs_f64(), self.stale_after.as_secs_f64())))
        }
        Ok(())
    }
}

#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Position { pub latitude: f64, pub longitude: f64 }

impl Position {
    pub fn new (latitude: f64, longitude: f64)->Self { Position{ latitude, longitude } }

    /// geodesic (WGS84) distance between two positions
    pub fn distance_to (&self, other: &Position)->Length {
        let p1 = Point::new( self.longitude, self.latitude);
        let p2 = Point::new( other.longitude, other.latitude);
        Length::new::<meter>( Geodesic.distance( p1, p2))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "{:.5}° {:.5}°", self.latitude, self.longitude)
    }
}

/// the decoded subset of an SBS position or velocity message we need to assess track continuity.
/// Everything besides `timestamp` and `icao24` is optional, and the two SBS message types we
/// consume normally only carry one of position or ground speed
#[derive(Debug,Clone,PartialEq)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub icao24: String,
    pub position: Option<Position>,
    pub altitude: Option<Length>,
    pub ground_speed: Option<Velocity>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "{}: {}", self.timestamp.format("%H:%M:%S%.3f"), self.icao24)?;
        if let Some(pos) = &self.position { write!( f, ", pos: {pos}")?; }
        if let Some(alt) = self.altitude { write!( f, ", alt: {:.0}ft", alt.get::<foot>())?; }
        if let Some(gs) = self.ground_speed { write!( f, ", gs: {:.0}kts", gs.get::<knot>())?; }
        Ok(())
    }
}
