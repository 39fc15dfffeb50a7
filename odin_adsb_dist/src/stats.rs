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

use std::fmt;
use crate::Continuity;

/// mean, standard deviation and sample count of one kind of continuity sample within a window.
/// Note the standard deviation divides by n, not n-1
#[derive(Debug,Clone,Copy,PartialEq,Default)]
pub struct WindowStatistics {
    pub mean: f64,
    pub sd: f64,
    pub n: usize,
}

impl WindowStatistics {
    /// empty sample sets yield all zeros
    pub fn from_samples (samples: &[f64])->Self {
        let n = samples.len();
        if n == 0 { return WindowStatistics::default() }

        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map( |x| (x - mean) * (x - mean)).sum::<f64>() / n as f64;

        WindowStatistics { mean, sd: var.sqrt(), n }
    }
}

impl fmt::Display for WindowStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "mean: {:.3}, sd: {:.3}, n: {}", self.mean, self.sd, self.n)
    }
}

/// the statistics of a completed window, which is what we persist
#[derive(Debug,Clone,Copy,PartialEq,Default)]
pub struct Snapshot {
    pub time_gap: WindowStatistics,
    pub displacement_ratio: WindowStatistics,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "time gap ({}), displacement ratio ({})", self.time_gap, self.displacement_ratio)
    }
}

/// continuity samples collected during the current window, in arrival order
#[derive(Debug,Default)]
pub struct DeltaSamples {
    time_gaps: Vec<f64>,
    displacement_ratios: Vec<f64>,
}

impl DeltaSamples {
    pub fn new ()->Self { DeltaSamples::default() }

    /// non-finite ratios are ignored so that a single bad sample can't spoil the whole window
    pub fn record (&mut self, continuity: &Continuity) {
        self.time_gaps.push( continuity.time_gap);
        if let Some(ratio) = continuity.displacement_ratio.filter( |r| r.is_finite()) {
            self.displacement_ratios.push( ratio);
        }
    }

    pub fn time_gaps (&self)->&[f64] { self.time_gaps.as_slice() }
    pub fn displacement_ratios (&self)->&[f64] { self.displacement_ratios.as_slice() }

    /// reduce the collected samples and start over
    pub fn take_snapshot (&mut self)->Snapshot {
        let snapshot = Snapshot {
            time_gap: WindowStatistics::from_samples( &self.time_gaps),
            displacement_ratio: WindowStatistics::from_samples( &self.displacement_ratios),
        };
        self.time_gaps.clear();
        self.displacement_ratios.clear();
        snapshot
    }
}
