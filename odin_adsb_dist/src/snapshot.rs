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

use std::{fs, io, fmt::Write as _, path::{Path,PathBuf}};
use crate::{stats::{Snapshot, WindowStatistics}, errors::{OdinAdsbDistError, Result, parse_error}};

/// snapshot keys in the order they are written
pub const SNAPSHOT_KEYS: [&'static str; 6] = ["ts_sd", "ts_mean", "ts_n", "pos_sd", "pos_mean", "pos_n"];

/// graph definition for the Munin plugin that reports our snapshot
pub const MUNIN_CONFIG: &'static str = "\
graph_title ADS-B message distribution
graph_vlabel sec, 1 sec displacement ratio
graph_category adsb
graph_info This graph characterises the quality of reception. A small s.d. indicates you're receiving most messages.
ts_sd.label S.d. time interval
ts_mean.label Mean time interval
ts_n.label ts sample size
pos_sd.label S.d. normalised displacement ratio
pos_mean.label Mean normalised displacement ratio
pos_n.label pos sample size
";

impl Snapshot {
    /// one "key value" line per statistic
    pub fn to_kv_string (&self)->String {
        let mut s = String::with_capacity(128);
        for (key,value) in SNAPSHOT_KEYS.iter().zip( self.values()) {
            let _ = writeln!( s, "{key} {value}");
        }
        s
    }

    /// the same lines in Munin fetch format ("key.value number")
    pub fn to_munin_string (&self)->String {
        let mut s = String::with_capacity(160);
        for (key,value) in SNAPSHOT_KEYS.iter().zip( self.values()) {
            let _ = writeln!( s, "{key}.value {value}");
        }
        s
    }

    fn values (&self)->[String;6] {
        let ts = &self.time_gap;
        let pos = &self.displacement_ratio;
        [ ts.sd.to_string(), ts.mean.to_string(), ts.n.to_string(),
          pos.sd.to_string(), pos.mean.to_string(), pos.n.to_string() ]
    }

    /// parse the `to_kv_string` format. All keys have to be present, unknown keys are ignored
    pub fn from_kv_str (s: &str)->Result<Snapshot> {
        let mut vals: [Option<&str>;6] = [None;6];

        for line in s.lines() {
            let mut it = line.split_whitespace();
            if let (Some(key), Some(value)) = (it.next(), it.next()) {
                if let Some(idx) = SNAPSHOT_KEYS.iter().position( |k| *k == key) {
                    vals[idx] = Some(value);
                }
            }
        }

        let f = |idx: usize|->Result<f64> {
            let v = vals[idx].ok_or_else( || parse_error!("missing snapshot key {}", SNAPSHOT_KEYS[idx]))?;
            v.parse::<f64>().map_err( |_| parse_error!("invalid value for {}: {}", SNAPSHOT_KEYS[idx], v))
        };
        let n = |idx: usize|->Result<usize> {
            let v = vals[idx].ok_or_else( || parse_error!("missing snapshot key {}", SNAPSHOT_KEYS[idx]))?;
            v.parse::<usize>().map_err( |_| parse_error!("invalid value for {}: {}", SNAPSHOT_KEYS[idx], v))
        };

        Ok( Snapshot {
            time_gap: WindowStatistics { sd: f(0)?, mean: f(1)?, n: n(2)? },
            displacement_ratio: WindowStatistics { sd: f(3)?, mean: f(4)?, n: n(5)? },
        })
    }
}

/// writes the snapshot of the last completed window
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new (path: impl Into<PathBuf>)->Self { SnapshotStore { path: path.into() } }

    pub fn path (&self)->&Path { self.path.as_path() }

    /// write to a temporary sibling first and then rename so that readers never see a partial file
    pub fn write (&self, snapshot: &Snapshot)->Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write( &tmp, snapshot.to_kv_string())?;
        if let Err(e) = fs::rename( &tmp, &self.path) {
            let _ = fs::remove_file( &tmp);
            return Err(e.into())
        }
        Ok(())
    }
}

/// read a snapshot file. A missing file is reported as `SnapshotMissing`
pub fn read_snapshot (path: impl AsRef<Path>)->Result<Snapshot> {
    let path = path.as_ref();
    match fs::read_to_string( path) {
        Ok(s) => Snapshot::from_kv_str( &s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err( OdinAdsbDistError::SnapshotMissing( path.to_path_buf())),
        Err(e) => Err(e.into())
    }
}
