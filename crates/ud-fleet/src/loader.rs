//! CSV establishment and fleet loader.
//!
//! # CSV formats
//!
//! **Establishments** — one row per establishment:
//!
//! ```csv
//! id,name,activity,lat,lon
//! e1,Bakery Morel,retail,45.7601,4.8552
//! h1,Rue Garibaldi 12,private_habitation,45.7570,4.8510
//! ```
//!
//! **Fleet** — one row per vehicle, carrying its round:
//!
//! ```csv
//! establishment_id,vehicle_id,kind,norm,departure_day,departure_hour,departure_minute,stops
//! e1,v1,van,euro4,monday,6,30,h1;h2
//! h1,v1,car,euro5,monday,7,0,e1
//! ```
//!
//! `stops` is a `;`-separated list of establishment ids, in visit order.
//! Vehicle ids are scoped to their establishment.
//!
//! A malformed or unreadable source fails the whole load — the pipeline
//! never proceeds with partial data.

use std::collections::BTreeMap;
use std::io::Read;

use serde::Deserialize;

use ud_core::{GeoPoint, SimTime, WeekDay};

use crate::{ActivityCategory, EmissionNorm, Establishment, FleetError, FleetResult, Round, Vehicle, VehicleKind};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct EstablishmentRecord {
    id:       String,
    name:     String,
    activity: String,
    lat:      f32,
    lon:      f32,
}

#[derive(Deserialize)]
struct FleetRecord {
    establishment_id: String,
    vehicle_id:       String,
    kind:             String,
    norm:             String,
    departure_day:    String,
    departure_hour:   u8,
    departure_minute: u8,
    stops:            String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load establishments and their fleets from two CSV sources.
///
/// Returns establishments keyed by id (`BTreeMap`, so downstream iteration
/// order is deterministic).  Accepts any `Read` source — pass
/// `std::io::Cursor` in tests or `std::fs::File` in applications.
pub fn load_establishments<R1: Read, R2: Read>(
    establishments_src: R1,
    fleet_src:          R2,
) -> FleetResult<BTreeMap<String, Establishment>> {
    let mut establishments: BTreeMap<String, Establishment> = BTreeMap::new();

    // ── Establishment rows ────────────────────────────────────────────────
    let mut reader = csv::Reader::from_reader(establishments_src);
    for result in reader.deserialize::<EstablishmentRecord>() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        let activity = ActivityCategory::parse(&row.activity).ok_or_else(|| {
            FleetError::Parse(format!("unknown activity {:?} for establishment {:?}", row.activity, row.id))
        })?;
        let establishment = Establishment::new(
            row.id.clone(),
            row.name,
            activity,
            GeoPoint::new(row.lat, row.lon),
        );
        if establishments.insert(row.id.clone(), establishment).is_some() {
            return Err(FleetError::Parse(format!("duplicate establishment id {:?}", row.id)));
        }
    }

    // ── Fleet rows ────────────────────────────────────────────────────────
    let mut reader = csv::Reader::from_reader(fleet_src);
    for result in reader.deserialize::<FleetRecord>() {
        let row = result.map_err(|e| FleetError::Parse(e.to_string()))?;
        let vehicle = Vehicle {
            id:   row.vehicle_id.clone(),
            kind: VehicleKind::parse(&row.kind).ok_or_else(|| {
                FleetError::Parse(format!("unknown vehicle kind {:?}", row.kind))
            })?,
            norm: EmissionNorm::parse(&row.norm).ok_or_else(|| {
                FleetError::Parse(format!("unknown emission norm {:?}", row.norm))
            })?,
        };
        let departure = parse_departure(&row)?;
        let stops = parse_stops(&row.stops);

        let Some(establishment) = establishments.get_mut(&row.establishment_id) else {
            return Err(FleetError::UnknownEstablishment {
                establishment: row.establishment_id,
                vehicle:       row.vehicle_id,
            });
        };
        let round = Round {
            origin: establishment.id.clone(),
            stops,
            departure,
        };
        if establishment.fleet.insert(row.vehicle_id.clone(), vehicle).is_some() {
            return Err(FleetError::Parse(format!(
                "duplicate vehicle id {:?} for establishment {:?}",
                row.vehicle_id, row.establishment_id
            )));
        }
        establishment.rounds.insert(row.vehicle_id, round);
    }

    // ── Cross-reference stops ─────────────────────────────────────────────
    for establishment in establishments.values() {
        for (vehicle_id, round) in &establishment.rounds {
            for stop in &round.stops {
                if !establishments.contains_key(stop) {
                    return Err(FleetError::UnknownEstablishment {
                        establishment: stop.clone(),
                        vehicle:       vehicle_id.clone(),
                    });
                }
            }
        }
    }

    if establishments.is_empty() {
        return Err(FleetError::NoEstablishments);
    }
    Ok(establishments)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_departure(row: &FleetRecord) -> FleetResult<SimTime> {
    let day = WeekDay::ALL
        .into_iter()
        .find(|d| d.as_str() == row.departure_day)
        .ok_or_else(|| FleetError::Parse(format!("unknown weekday {:?}", row.departure_day)))?;
    if row.departure_hour >= 24 || row.departure_minute >= 60 {
        return Err(FleetError::Parse(format!(
            "invalid departure time {:02}:{:02} for vehicle {:?}",
            row.departure_hour, row.departure_minute, row.vehicle_id
        )));
    }
    Ok(SimTime::new(day, row.departure_hour, row.departure_minute))
}

fn parse_stops(s: &str) -> Vec<String> {
    s.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}
