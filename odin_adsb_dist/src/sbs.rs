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

use std::{str::FromStr, time::Duration};
use chrono::{DateTime, Local, TimeDelta, Utc, NaiveDate, NaiveTime, TimeZone, offset::LocalResult};
use chrono_tz::Tz;
use tokio::{self, net::TcpStream, io::{BufReader, AsyncBufReadExt}, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, error};
use uom::si::{f64::{Length,Velocity}, length::foot, velocity::knot};

use crate::errors::{Result, OdinAdsbDistError, parse_error};
use crate::{adsb::{AdsbDistConfig, Message, Position}, queue::MsgSender};

/// the comma separated fields of a single SBS line
pub struct SbsFields<'a> {
    line: &'a str,
    fields: Vec<&'a str>,
}

impl<'a> SbsFields<'a> {
    pub fn new (line: &'a str)->Self {
        let line = line.trim_end_matches( ['\r','\n']);
        SbsFields { line, fields: line.split(',').collect() }
    }

    pub fn line (&self)->&'a str { self.line }

    /// the trimmed field at `idx`, None if it is missing or empty
    pub fn str_field (&self, idx: usize)->Option<&'a str> {
        self.fields.get(idx).map( |s| s.trim()).filter( |s| !s.is_empty())
    }

    /// parse an optional field. Empty fields are Ok(None), non-empty ones that don't parse are errors
    pub fn field<T: FromStr> (&self, idx: usize)->Result<Option<T>> {
        match self.str_field(idx) {
            Some(s) => s.parse::<T>().map( Some).map_err( |_| parse_error!("invalid field {} '{}'", idx, s)),
            None => Ok(None)
        }
    }

    fn finite_field (&self, idx: usize)->Result<Option<f64>> {
        match self.field::<f64>(idx)? {
            Some(v) if !v.is_finite() => Err( parse_error!("non-finite field {} '{}'", idx, v)),
            v => Ok(v)
        }
    }
}

/// SBS as documented on http://woodair.net/SBS/Article/Barebones42_Socket_Data.htm
///
/// Message examples:
///  MSG,1,111,11111,AA2BC2,111111,2016/03/11,13:07:16.663,2016/03/11,13:07:16.626,UAL814  ,,,,,,,,,,,0
///  MSG,3,111,11111,A04424,111111,2016/03/11,13:07:05.343,2016/03/11,13:07:05.288,,11025,,,37.17274,-122.03935,,,,,,0
///  MSG,4,111,11111,AC1FCC,111111,2016/03/11,13:07:07.777,2016/03/11,13:07:07.713,,,316,106,,,1536,,,,,0
///
/// fields we use:
///   0: message type (MSG, SEL, ID, AIR, STA, CLK)
///   1: transmission type (MSG only: 3 airborne position, 4 airborne velocity)
///   4: ICAO 24 bit id (mode S transponder code)
///   6: date generated
///   7: time generated
///  11: mode-C altitude in ft
///  12: ground speed in kts
///  14: latitude
///  15: longitude
///
/// Returns Ok(None) for records that do not carry position or velocity. Those are not inspected
/// any further, i.e. they can't produce errors
pub fn parse_msg<T: TimeZone> (line: &str, source_tz: &T)->Result<Option<Message>> {
    let sbs = SbsFields::new(line);

    if sbs.str_field(0) != Some("MSG") { return Ok(None) }
    if !matches!( sbs.str_field(1), Some("3") | Some("4")) { return Ok(None) }

    let icao24 = sbs.str_field(4).ok_or_else( || parse_error!("missing icao24 in SBS message: {}", sbs.line()))?;
    let date = sbs.str_field(6).ok_or_else( || parse_error!("missing date in SBS message: {}", sbs.line()))?;
    let time = sbs.str_field(7).ok_or_else( || parse_error!("missing time in SBS message: {}", sbs.line()))?;
    let timestamp = get_utc_datetime( date, time, source_tz)?;

    let position = match (sbs.finite_field(14)?, sbs.finite_field(15)?) {
        (Some(latitude), Some(longitude)) => {
            if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
                return Err( parse_error!("position out of range in SBS message: {}", sbs.line()))
            }
            Some( Position{ latitude, longitude })
        }
        _ => None
    };

    let altitude = sbs.finite_field(11)?.map( |alt| Length::new::<foot>(alt));

    let ground_speed = match sbs.finite_field(12)? {
        Some(gs) if gs < 0.0 => return Err( parse_error!("negative ground speed in SBS message: {}", sbs.line())),
        Some(gs) => Some( Velocity::new::<knot>(gs)),
        None => None
    };

    Ok( Some( Message{ timestamp, icao24: icao24.to_string(), position, altitude, ground_speed }))
}

/// parse with the configured source timezone, or the timezone of this host if there is none
pub fn parse_feed_msg (line: &str, source_tz: Option<&Tz>)->Result<Option<Message>> {
    match source_tz {
        Some(tz) => parse_msg( line, tz),
        None => parse_msg( line, &Local)
    }
}

// note that dump1090 does report time in local timezone, i.e. we have to convert to UTC
fn get_utc_datetime<T: TimeZone> (date: &str, time: &str, tz: &T)->Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str( date, "%Y/%m/%d")?;
    let time = NaiveTime::parse_from_str( time, "%H:%M:%S%.f")?;

    let dt = match tz.from_local_datetime( &date.and_time(time)) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(_, dt2) => dt2, // we don't care about that precision
        LocalResult::None => return Err( OdinAdsbDistError::OpFailedError("forward time jump cannot be mapped to UTC".into())),
    };
    Ok( dt.with_timezone( &Utc) )
}

/// reads SBS messages from a socket and pushes the ones we can use into the message queue.
/// The connection is re-established whenever it fails, for as long as we are not cancelled
pub struct SbsFeedClient {
    addr: String,
    source_tz: Option<Tz>,
    connect_retry: Duration,
    reconnect_pause: Duration,
    queue: MsgSender,
    cancel: CancellationToken,
}

impl SbsFeedClient {
    pub fn new (config: &AdsbDistConfig, queue: MsgSender, cancel: CancellationToken)->Self {
        SbsFeedClient {
            addr: config.feed_addr(),
            source_tz: config.timezone,
            connect_retry: config.connect_retry,
            reconnect_pause: config.reconnect_pause,
            queue,
            cancel
        }
    }

    /// this only returns when we get cancelled or the queue consumer went away
    pub async fn run (self)->Result<()> {
        while let Some(stream) = self.connect().await {
            match self.read_msgs( stream).await {
                Ok(()) => {
                    if self.cancel.is_cancelled() { break }
                    info!("connection to {} closed by peer", self.addr);
                }
                Err(OdinAdsbDistError::QueueClosed) => {
                    error!("message queue closed, terminating feed client");
                    return Err(OdinAdsbDistError::QueueClosed)
                }
                Err(e) => error!("socket error on {}: {}", self.addr, e)
            }

            if !self.pause( self.reconnect_pause).await { break }
        }

        info!("feed client for {} terminated", self.addr);
        Ok(())
    }

    /// retry until we get a connection. Returns None if we got cancelled while waiting
    async fn connect (&self)->Option<TcpStream> {
        while !self.cancel.is_cancelled() {
            match TcpStream::connect( self.addr.as_str()).await {
                Ok(stream) => {
                    info!("(re)connected to {}", self.addr);
                    return Some(stream)
                }
                Err(e) => {
                    info!("waiting for {} - {}", self.addr, e);
                    if !self.pause( self.connect_retry).await { return None }
                }
            }
        }
        None
    }

    /// sleep for `dur` unless we get cancelled first, in which case we return false
    async fn pause (&self, dur: Duration)->bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = sleep( dur) => true
        }
    }

    /// a feed that is hours off our own clock most likely means a wrong timezone setting, in
    /// which case all prior sightings look stale and we never get any samples
    fn check_clock (&self, msg: &Message) {
        let offset = (Utc::now() - msg.timestamp).abs();
        if offset > TimeDelta::seconds(1800) {
            warn!("feed time {} is {} min off our clock, check timezone config ({})",
                  msg.timestamp, offset.num_minutes(), self.source_tz.map( |tz| tz.name()).unwrap_or("local"));
        }
    }

    /// returns Ok(()) on EOF or cancellation. Records that fail to decode are dropped, socket
    /// errors are returned (and lead to a reconnect)
    async fn read_msgs (&self, stream: TcpStream)->Result<()> {
        let mut reader = BufReader::with_capacity( 8192, stream);
        let mut buf: Vec<u8> = Vec::with_capacity(256);
        let mut clock_checked = false;

        loop {
            buf.clear();
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                res = reader.read_until( b'\n', &mut buf) => { res?; }
            }
            if buf.last() != Some(&b'\n') { return Ok(()) } // EOF, an incomplete last record is discarded

            let line = String::from_utf8_lossy( &buf);
            match parse_feed_msg( &line, self.source_tz.as_ref()) {
                Ok(Some(msg)) => {
                    debug!("{}", msg);
                    if !clock_checked {
                        self.check_clock( &msg);
                        clock_checked = true;
                    }
                    self.queue.push( msg).await?
                }
                Ok(None) => {} // not a position or velocity message
                Err(e) => warn!("dropping SBS record: {}", e)
            }
        }
    }
}
