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
#![allow(unused)]

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use uom::si::{length::foot, velocity::knot};
use odin_adsb_dist::{adsb::Position, sbs::{parse_msg, SbsFields}};

//--- test data (dump1090 SBS output)
const MSG_1: &'static str = "MSG,1,111,11111,AA2BC2,111111,2016/03/11,13:07:16.663,2016/03/11,13:07:16.626,UAL814  ,,,,,,,,,,,0";
const MSG_3: &'static str = "MSG,3,111,11111,A04424,111111,2016/03/11,13:07:05.343,2016/03/11,13:07:05.288,,11025,,,37.17274,-122.03935,,,,,,0";
const MSG_4: &'static str = "MSG,4,111,11111,AC1FCC,111111,2016/03/11,13:07:07.777,2016/03/11,13:07:07.713,,,316,106,,,1536,,,,,0";
const MSG_3_NO_POS: &'static str = "MSG,3,111,11111,A04424,111111,2016/03/11,13:07:05.343,2016/03/11,13:07:05.288,,11025,,,,,,,,,,0";
const MSG_3_LAT_ONLY: &'static str = "MSG,3,111,11111,A04424,111111,2016/03/11,13:07:05.343,2016/03/11,13:07:05.288,,,,,37.17274,,,,,,,0";
const MSG_3_NO_TIME: &'static str = "MSG,3,111,11111,A04424,111111,2016/03/11,,2016/03/11,13:07:05.288,,11025,,,37.17274,-122.03935,,,,,,0";
const MSG_3_BAD_TIME: &'static str = "MSG,3,111,11111,A04424,111111,2016/03/11,25:07:05.343,2016/03/11,13:07:05.288,,11025,,,37.17274,-122.03935,,,,,,0";
const MSG_3_NO_ICAO: &'static str = "MSG,3,111,11111,,111111,2016/03/11,13:07:05.343,2016/03/11,13:07:05.288,,11025,,,37.17274,-122.03935,,,,,,0";
const MSG_4_BAD_GS: &'static str = "MSG,4,111,11111,AC1FCC,111111,2016/03/11,13:07:07.777,2016/03/11,13:07:07.713,,,fast,106,,,1536,,,,,0";
const MSG_4_NEG_GS: &'static str = "MSG,4,111,11111,AC1FCC,111111,2016/03/11,13:07:07.777,2016/03/11,13:07:07.713,,,-12,106,,,1536,,,,,0";
const MSG_3_BAD_LAT: &'static str = "MSG,3,111,11111,A04424,111111,2016/03/11,13:07:05.343,2016/03/11,13:07:05.288,,11025,,,95.0,-122.03935,,,,,,0";
const MSG_3_BAD_LON: &'static str = "MSG,3,111,11111,A04424,111111,2016/03/11,13:07:05.343,2016/03/11,13:07:05.288,,11025,,,37.17274,-190.5,,,,,,0";
const STA: &'static str = "STA,,5,179,400AE7,10103,2008/11/28,14:58:51.153,2008/11/28,14:58:51.153,RM";

// run with "cargo test --test test_sbs -- --nocapture"

#[test]
fn test_fields () {
    let sbs = SbsFields::new( "MSG,3, 111 ,,x\r\n");
    assert_eq!( sbs.line(), "MSG,3, 111 ,,x");
    assert_eq!( sbs.str_field(2), Some("111"));
    assert_eq!( sbs.str_field(3), None);
    assert_eq!( sbs.str_field(42), None);
    assert_eq!( sbs.field::<u64>(2).unwrap(), Some(111));
    assert_eq!( sbs.field::<u64>(3).unwrap(), None);
    assert!( sbs.field::<u64>(4).is_err());
}

#[test]
fn test_parse_position () {
    let msg = parse_msg( MSG_3, &Tz::UTC).unwrap().expect("no message");
    println!("{msg}");

    assert_eq!( msg.icao24, "A04424");
    assert_eq!( msg.timestamp, Utc.with_ymd_and_hms( 2016, 3, 11, 13, 7, 5).unwrap() + chrono::TimeDelta::milliseconds(343));
    assert_eq!( msg.position, Some( Position::new( 37.17274, -122.03935)));
    assert!( (msg.altitude.unwrap().get::<foot>() - 11025.0).abs() < 1e-6);
    assert!( msg.ground_speed.is_none());
}

#[test]
fn test_parse_velocity () {
    let msg = parse_msg( MSG_4, &Tz::UTC).unwrap().expect("no message");
    println!("{msg}");

    assert_eq!( msg.icao24, "AC1FCC");
    assert!( msg.position.is_none());
    assert!( msg.altitude.is_none());
    assert!( (msg.ground_speed.unwrap().get::<knot>() - 316.0).abs() < 1e-9);
}

#[test]
fn test_absent_fields () {
    let msg = parse_msg( MSG_3_NO_POS, &Tz::UTC).unwrap().expect("no message");
    assert!( msg.position.is_none());
    assert!( msg.altitude.is_some());

    // we need both coordinates for a position
    let msg = parse_msg( MSG_3_LAT_ONLY, &Tz::UTC).unwrap().expect("no message");
    assert!( msg.position.is_none());
    assert!( msg.altitude.is_none());
    assert!( msg.ground_speed.is_none());
}

#[test]
fn test_ignored_records () {
    assert!( parse_msg( MSG_1, &Tz::UTC).unwrap().is_none());
    assert!( parse_msg( STA, &Tz::UTC).unwrap().is_none());
    assert!( parse_msg( "", &Tz::UTC).unwrap().is_none());
    assert!( parse_msg( "garbage", &Tz::UTC).unwrap().is_none());
}

#[test]
fn test_malformed_records () {
    for line in [MSG_3_NO_TIME, MSG_3_BAD_TIME, MSG_3_NO_ICAO, MSG_4_BAD_GS, MSG_4_NEG_GS, MSG_3_BAD_LAT, MSG_3_BAD_LON] {
        let res = parse_msg( line, &Tz::UTC);
        println!("{line} -> {res:?}");
        assert!( res.is_err());
    }
}

#[test]
fn test_local_time () {
    let tz: Tz = "America/Los_Angeles".parse().unwrap();
    let msg = parse_msg( MSG_3, &tz).unwrap().expect("no message");

    // PST is UTC-8 on 2016/03/11
    assert_eq!( msg.timestamp, Utc.with_ymd_and_hms( 2016, 3, 11, 21, 7, 5).unwrap() + chrono::TimeDelta::milliseconds(343));
}

#[test]
fn test_crlf () {
    let line = format!("{MSG_4}\r\n");
    let msg = parse_msg( &line, &Tz::UTC).unwrap().expect("no message");
    assert_eq!( msg.icao24, "AC1FCC");
}
