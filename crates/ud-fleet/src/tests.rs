//! Unit tests for ud-fleet.

use std::io::Cursor;

use ud_core::{GeoPoint, SimRng, SimTime, WeekDay};
use ud_spatial::{NoRepair, RoadClass, RoadGraph, RoadGraphBuilder};

use crate::{
    load_establishments, preprocess, ActivityCategory, EmissionNorm, FleetError, NoPolicy,
    Personality, PolicyEngine, RetrofitPolicy,
};

// ── Fixtures ──────────────────────────────────────────────────────────────────

const ESTABLISHMENTS_CSV: &str = "\
id,name,activity,lat,lon
e1,Bakery Morel,retail,45.7601,4.8552
h1,Rue Garibaldi 12,private_habitation,45.7570,4.8510
h2,Cours Lafayette 3,private_habitation,45.7622,4.8570
";

const FLEET_CSV: &str = "\
establishment_id,vehicle_id,kind,norm,departure_day,departure_hour,departure_minute,stops
e1,v1,van,euro3,monday,6,30,h1;h2
h1,v1,car,euro5,monday,7,0,e1
h2,v1,car,euro4,monday,7,0,e1
";

/// Two residential nodes plus one motorway node sitting right on e1.
fn mixed_graph() -> RoadGraph {
    let mut b = RoadGraphBuilder::new();
    let m = b.add_node(GeoPoint::new(45.7601, 4.8552), RoadClass::Motorway);
    let r1 = b.add_node(GeoPoint::new(45.7575, 4.8515), RoadClass::Residential);
    let r2 = b.add_node(GeoPoint::new(45.7625, 4.8575), RoadClass::Residential);
    b.add_road(m, r1);
    b.add_road(r1, r2);
    b.build()
}

// ── Loader ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader_tests {
    use super::*;

    #[test]
    fn loads_establishments_and_fleets() {
        let map =
            load_establishments(Cursor::new(ESTABLISHMENTS_CSV), Cursor::new(FLEET_CSV)).unwrap();
        assert_eq!(map.len(), 3);

        let e1 = &map["e1"];
        assert_eq!(e1.activity, ActivityCategory::Retail);
        assert_eq!(e1.fleet.len(), 1);
        let round = &e1.rounds["v1"];
        assert_eq!(round.origin, "e1");
        assert_eq!(round.stops, vec!["h1", "h2"]);
        assert_eq!(round.departure, SimTime::new(WeekDay::Monday, 6, 30));

        let h1 = &map["h1"];
        assert!(h1.activity.is_private());
        assert_eq!(h1.fleet["v1"].norm, EmissionNorm::Euro5);
    }

    #[test]
    fn malformed_row_is_fatal() {
        let bad = "id,name,activity,lat,lon\ne1,Bakery,retail,not_a_number,4.85\n";
        let err = load_establishments(Cursor::new(bad), Cursor::new(FLEET_CSV)).unwrap_err();
        assert!(matches!(err, FleetError::Parse(_)), "got {err}");
    }

    #[test]
    fn unknown_activity_is_fatal() {
        let bad = "id,name,activity,lat,lon\ne1,Bakery,bakery,45.76,4.85\n";
        let err = load_establishments(Cursor::new(bad), Cursor::new(FLEET_CSV)).unwrap_err();
        assert!(matches!(err, FleetError::Parse(_)));
    }

    #[test]
    fn fleet_row_for_unknown_establishment_is_fatal() {
        let fleet = "\
establishment_id,vehicle_id,kind,norm,departure_day,departure_hour,departure_minute,stops
ghost,v1,van,euro4,monday,6,0,e1
";
        let err =
            load_establishments(Cursor::new(ESTABLISHMENTS_CSV), Cursor::new(fleet)).unwrap_err();
        assert!(matches!(err, FleetError::UnknownEstablishment { .. }));
    }

    #[test]
    fn unknown_stop_is_fatal() {
        let fleet = "\
establishment_id,vehicle_id,kind,norm,departure_day,departure_hour,departure_minute,stops
e1,v1,van,euro4,monday,6,0,nowhere
";
        let err =
            load_establishments(Cursor::new(ESTABLISHMENTS_CSV), Cursor::new(fleet)).unwrap_err();
        assert!(matches!(err, FleetError::UnknownEstablishment { .. }));
    }

    #[test]
    fn empty_establishment_source_is_fatal() {
        let empty = "id,name,activity,lat,lon\n";
        let fleet = "establishment_id,vehicle_id,kind,norm,departure_day,departure_hour,departure_minute,stops\n";
        let err = load_establishments(Cursor::new(empty), Cursor::new(fleet)).unwrap_err();
        assert!(matches!(err, FleetError::NoEstablishments));
    }

    #[test]
    fn empty_stop_list_parses_to_no_stops() {
        let fleet = "\
establishment_id,vehicle_id,kind,norm,departure_day,departure_hour,departure_minute,stops
e1,v1,van,euro4,monday,6,0,
";
        let map =
            load_establishments(Cursor::new(ESTABLISHMENTS_CSV), Cursor::new(fleet)).unwrap();
        assert_eq!(map["e1"].rounds["v1"].stop_count(), 0);
    }
}

// ── Personality ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod personality_tests {
    use super::*;

    #[test]
    fn accumulates_journey_time() {
        let mut p = Personality::new(ActivityCategory::PrivateHabitation, "v1");
        p.record_journey(35);
        p.record_journey(41);
        assert_eq!(p.journey_minutes, 76);
        assert_eq!(p.rounds_completed(), 2);
    }

    #[test]
    fn satisfaction_decreases_with_travel() {
        let mut quick = Personality::new(ActivityCategory::PrivateHabitation, "v1");
        quick.record_journey(30);
        let mut slow = Personality::new(ActivityCategory::PrivateHabitation, "v2");
        slow.record_journey(300);
        assert!(quick.compute_satisfaction() > slow.compute_satisfaction());
    }

    #[test]
    fn satisfaction_is_clamped() {
        let mut p = Personality::new(ActivityCategory::PrivateHabitation, "v1");
        p.record_journey(100_000);
        assert_eq!(p.compute_satisfaction(), -1.0);
    }
}

// ── Policy ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod policy_tests {
    use super::*;

    #[test]
    fn retrofit_replaces_when_probabilities_are_zero() {
        let map =
            load_establishments(Cursor::new(ESTABLISHMENTS_CSV), Cursor::new(FLEET_CSV)).unwrap();
        let mut e1 = map.into_iter().find(|(k, _)| k == "e1").unwrap().1;

        let policy = RetrofitPolicy {
            min_norm:             EmissionNorm::Euro5,
            fraud_probability:    0.0,
            mobility_probability: 0.0,
        };
        let outcome = policy.preprocess(&mut e1, &mut SimRng::new(1));
        assert_eq!(outcome.replaced, 1);
        assert_eq!(outcome.mobility_changed, 0);
        assert_eq!(outcome.frauds, 0);
        assert_eq!(e1.fleet["v1"].norm, EmissionNorm::Euro5);
    }

    #[test]
    fn retrofit_vacates_slot_on_mobility_change() {
        let map =
            load_establishments(Cursor::new(ESTABLISHMENTS_CSV), Cursor::new(FLEET_CSV)).unwrap();
        let mut e1 = map.into_iter().find(|(k, _)| k == "e1").unwrap().1;

        let policy = RetrofitPolicy {
            min_norm:             EmissionNorm::Euro5,
            fraud_probability:    0.0,
            mobility_probability: 1.0,
        };
        let outcome = policy.preprocess(&mut e1, &mut SimRng::new(1));
        assert_eq!(outcome.mobility_changed, 1);
        assert!(e1.fleet.is_empty(), "slot must be vacated");
        // The round is kept; only the vehicle is gone.
        assert_eq!(e1.rounds.len(), 1);
    }

    #[test]
    fn compliant_fleet_is_untouched() {
        let map =
            load_establishments(Cursor::new(ESTABLISHMENTS_CSV), Cursor::new(FLEET_CSV)).unwrap();
        let mut h1 = map.into_iter().find(|(k, _)| k == "h1").unwrap().1;

        let policy = RetrofitPolicy {
            min_norm: EmissionNorm::Euro5,
            fraud_probability: 1.0,
            mobility_probability: 1.0,
        };
        let outcome = policy.preprocess(&mut h1, &mut SimRng::new(1));
        assert_eq!(outcome, Default::default());
        assert_eq!(h1.fleet.len(), 1);
    }
}

// ── Preprocess pipeline ───────────────────────────────────────────────────────

#[cfg(test)]
mod preprocess_tests {
    use super::*;

    #[test]
    fn resolves_every_establishment_to_an_eligible_node() {
        let graph = mixed_graph();
        let (map, report) = preprocess(
            &graph,
            &mut NoRepair,
            Cursor::new(ESTABLISHMENTS_CSV),
            Cursor::new(FLEET_CSV),
            &NoPolicy,
            &mut SimRng::new(7),
        )
        .unwrap();

        assert_eq!(report.establishments, 3);
        assert_eq!(report.vehicles, 3);
        for establishment in map.values() {
            let node = establishment.resolved_node().expect("resolved during preprocessing");
            assert!(
                graph.node_class[node.index()].is_delivery_eligible(),
                "establishment {} resolved onto forbidden class",
                establishment.id
            );
        }
        // e1 sits exactly on the motorway node, but must resolve to the
        // nearest residential node (r2) instead.
        assert_eq!(map["e1"].resolved_node().unwrap().0, 2);
    }

    #[test]
    fn creates_one_personality_per_vehicle() {
        let (map, _) = preprocess(
            &mixed_graph(),
            &mut NoRepair,
            Cursor::new(ESTABLISHMENTS_CSV),
            Cursor::new(FLEET_CSV),
            &NoPolicy,
            &mut SimRng::new(7),
        )
        .unwrap();
        for establishment in map.values() {
            assert_eq!(establishment.personalities.len(), establishment.rounds.len());
        }
    }

    #[test]
    fn counts_dead_ends() {
        let mut b = RoadGraphBuilder::new();
        let r1 = b.add_node(GeoPoint::new(45.757, 4.851), RoadClass::Residential);
        let r2 = b.add_node(GeoPoint::new(45.762, 4.857), RoadClass::Residential);
        let trap = b.add_node(GeoPoint::new(45.760, 4.855), RoadClass::Residential);
        b.add_road(r1, r2);
        b.add_directed_edge(r1, trap); // no way back out
        let graph = b.build();

        let (_, report) = preprocess(
            &graph,
            &mut NoRepair,
            Cursor::new(ESTABLISHMENTS_CSV),
            Cursor::new(FLEET_CSV),
            &NoPolicy,
            &mut SimRng::new(7),
        )
        .unwrap();
        assert_eq!(report.dead_ends, 1);
    }

    #[test]
    fn graph_without_eligible_nodes_is_fatal() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_node(GeoPoint::new(45.75, 4.85), RoadClass::Motorway);
        let c = b.add_node(GeoPoint::new(45.76, 4.85), RoadClass::Trunk);
        b.add_road(a, c);
        let err = preprocess(
            &b.build(),
            &mut NoRepair,
            Cursor::new(ESTABLISHMENTS_CSV),
            Cursor::new(FLEET_CSV),
            &NoPolicy,
            &mut SimRng::new(7),
        )
        .unwrap_err();
        assert!(matches!(err, FleetError::NoEligibleNodes));
    }

    #[test]
    fn load_failure_aborts_the_pipeline() {
        let err = preprocess(
            &mixed_graph(),
            &mut NoRepair,
            Cursor::new("id,name,activity,lat,lon\n"),
            Cursor::new(FLEET_CSV),
            &NoPolicy,
            &mut SimRng::new(7),
        )
        .unwrap_err();
        assert!(matches!(err, FleetError::NoEstablishments));
    }

    #[test]
    fn policy_counters_are_aggregated() {
        let policy = RetrofitPolicy {
            min_norm:             EmissionNorm::Euro6,
            fraud_probability:    0.0,
            mobility_probability: 0.0,
        };
        let (_, report) = preprocess(
            &mixed_graph(),
            &mut NoRepair,
            Cursor::new(ESTABLISHMENTS_CSV),
            Cursor::new(FLEET_CSV),
            &policy,
            &mut SimRng::new(7),
        )
        .unwrap();
        // Every loaded vehicle (euro3, euro5, euro4) is below euro6.
        assert_eq!(report.policy.replaced, 3);
        assert_eq!(report.vehicles, 3);
    }
}
