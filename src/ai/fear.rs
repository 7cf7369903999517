//! Fear destinations: pre-authored safe points for fleeing combatants

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

/// How to pick a point when none offers a clean escape route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FearSelection {
    /// Take an escape-route point if there is one, else the first eligible point
    #[default]
    PreferEscapeRoute,
    /// Only accept points the fear source is farther from than the fleeing combatant
    StrictEscapeRoute,
}

/// The scene's set of safe points
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FearDestinations {
    points: Vec<Vec2>,
}

impl FearDestinations {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Choose where `fleeing` should run to get away from `source`
    ///
    /// A point is eligible when it is at least `min_distance` from the fleeing
    /// combatant and reachable. An eligible point the source is farther from
    /// than the fleeing combatant wins immediately.
    pub fn select(
        &self,
        fleeing: Vec2,
        source: Vec2,
        min_distance: f32,
        selection: FearSelection,
        is_reachable: impl Fn(Vec2) -> bool,
    ) -> Option<Vec2> {
        let mut fallback = None;
        for &point in &self.points {
            let from_fleeing = fleeing.distance(&point);
            if from_fleeing < min_distance || !is_reachable(point) {
                continue;
            }
            if source.distance(&point) > from_fleeing {
                return Some(point);
            }
            if fallback.is_none() {
                fallback = Some(point);
            }
        }
        match selection {
            FearSelection::PreferEscapeRoute => fallback,
            FearSelection::StrictEscapeRoute => None,
        }
    }
}
