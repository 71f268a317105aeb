//! Establishment, vehicle, and round data model.

use std::collections::BTreeMap;
use std::fmt;

use ud_core::{GeoPoint, NodeId, SimTime};

use crate::Personality;

// ── ActivityCategory ──────────────────────────────────────────────────────────

/// What an establishment does, after the ST8 activity nomenclature.
///
/// `PrivateHabitation` fleets are commuters; every other category runs
/// delivery rounds.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ActivityCategory {
    Agriculture,
    Industry,
    Wholesale,
    Retail,
    Transport,
    Office,
    PublicService,
    PrivateHabitation,
}

impl ActivityCategory {
    /// `true` for commuter fleets (as opposed to delivery fleets).
    #[inline]
    pub fn is_private(self) -> bool {
        matches!(self, ActivityCategory::PrivateHabitation)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityCategory::Agriculture       => "agriculture",
            ActivityCategory::Industry          => "industry",
            ActivityCategory::Wholesale         => "wholesale",
            ActivityCategory::Retail            => "retail",
            ActivityCategory::Transport         => "transport",
            ActivityCategory::Office            => "office",
            ActivityCategory::PublicService     => "public_service",
            ActivityCategory::PrivateHabitation => "private_habitation",
        }
    }

    /// Inverse of [`as_str`](Self::as_str).
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "agriculture"        => ActivityCategory::Agriculture,
            "industry"           => ActivityCategory::Industry,
            "wholesale"          => ActivityCategory::Wholesale,
            "retail"             => ActivityCategory::Retail,
            "transport"          => ActivityCategory::Transport,
            "office"             => ActivityCategory::Office,
            "public_service"     => ActivityCategory::PublicService,
            "private_habitation" => ActivityCategory::PrivateHabitation,
            _ => return None,
        })
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Vehicle ───────────────────────────────────────────────────────────────────

/// Body type of a fleet vehicle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum VehicleKind {
    Car,
    Van,
    LightTruck,
    HeavyTruck,
}

impl VehicleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleKind::Car        => "car",
            VehicleKind::Van        => "van",
            VehicleKind::LightTruck => "light_truck",
            VehicleKind::HeavyTruck => "heavy_truck",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "car"         => VehicleKind::Car,
            "van"         => VehicleKind::Van,
            "light_truck" => VehicleKind::LightTruck,
            "heavy_truck" => VehicleKind::HeavyTruck,
            _ => return None,
        })
    }
}

/// European emission standard of a vehicle.  `Ord` follows stringency:
/// `Euro1 < … < Euro6`, so "below the mandated norm" is a plain `<`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum EmissionNorm {
    Euro1,
    Euro2,
    Euro3,
    Euro4,
    Euro5,
    Euro6,
}

impl EmissionNorm {
    pub fn as_str(self) -> &'static str {
        match self {
            EmissionNorm::Euro1 => "euro1",
            EmissionNorm::Euro2 => "euro2",
            EmissionNorm::Euro3 => "euro3",
            EmissionNorm::Euro4 => "euro4",
            EmissionNorm::Euro5 => "euro5",
            EmissionNorm::Euro6 => "euro6",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "euro1" => EmissionNorm::Euro1,
            "euro2" => EmissionNorm::Euro2,
            "euro3" => EmissionNorm::Euro3,
            "euro4" => EmissionNorm::Euro4,
            "euro5" => EmissionNorm::Euro5,
            "euro6" => EmissionNorm::Euro6,
            _ => return None,
        })
    }
}

/// One fleet vehicle.  The emission fields are read by policy engines; the
/// emission tables themselves live outside this crate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vehicle {
    pub id:   String,
    pub kind: VehicleKind,
    pub norm: EmissionNorm,
}

// ── Round ─────────────────────────────────────────────────────────────────────

/// An ordered sequence of establishment stops, starting and ending at the
/// origin establishment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
    /// Establishment the round starts from and returns to.
    pub origin: String,

    /// Establishments to visit, in order.  A commuter round holds the
    /// workplace(s); a delivery round holds the customers.
    pub stops: Vec<String>,

    /// Scheduled first departure, carried by the source data.  Commuter
    /// archetypes draw their own departure windows instead.
    pub departure: SimTime,
}

impl Round {
    /// Number of establishments visited before returning to the origin.
    #[inline]
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }
}

// ── Establishment ─────────────────────────────────────────────────────────────

/// A location owning a fleet of vehicles and, per vehicle, a round and a
/// personality.
#[derive(Debug)]
pub struct Establishment {
    pub id:       String,
    pub name:     String,
    pub activity: ActivityCategory,
    pub location: GeoPoint,

    /// Vehicle id → vehicle.  Policy preprocessing may vacate slots
    /// (mobility change); vacated vehicles build no agent.
    pub fleet: BTreeMap<String, Vehicle>,

    /// Vehicle id → round.  Keys mirror the fleet as loaded.
    pub rounds: BTreeMap<String, Round>,

    /// Vehicle id → personality.  Populated by preprocessing.
    pub personalities: BTreeMap<String, Personality>,

    /// Nearest delivery-eligible road node, set exactly once by
    /// preprocessing.
    resolved_node: Option<NodeId>,
}

impl Establishment {
    pub fn new(
        id:       String,
        name:     String,
        activity: ActivityCategory,
        location: GeoPoint,
    ) -> Self {
        Self {
            id,
            name,
            activity,
            location,
            fleet:         BTreeMap::new(),
            rounds:        BTreeMap::new(),
            personalities: BTreeMap::new(),
            resolved_node: None,
        }
    }

    /// The resolved road node, or `None` before preprocessing.
    #[inline]
    pub fn resolved_node(&self) -> Option<NodeId> {
        self.resolved_node
    }

    /// Record the resolved node.  The value is immutable once set.
    ///
    /// # Panics
    /// Panics in debug mode on a second call.
    pub fn set_resolved_node(&mut self, node: NodeId) {
        debug_assert!(self.resolved_node.is_none(), "resolved node is set once");
        self.resolved_node = Some(node);
    }
}
