//! Looping waypoint routes

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SkirmishError};
use crate::core::types::Vec2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PatrolRouteData")]
pub struct PatrolRoute {
    waypoints: Vec<Vec2>,
    index: usize,
}

/// Unchecked wire form; only becomes a route through `PatrolRoute::new`
#[derive(Deserialize)]
struct PatrolRouteData {
    waypoints: Vec<Vec2>,
    #[serde(default)]
    index: usize,
}

impl TryFrom<PatrolRouteData> for PatrolRoute {
    type Error = SkirmishError;

    fn try_from(data: PatrolRouteData) -> Result<Self> {
        let mut route = Self::new(data.waypoints, "deserialized route")?;
        route.index = data.index % route.waypoints.len();
        Ok(route)
    }
}

impl PatrolRoute {
    /// Build a route; `owner` names the combatant in the error
    pub fn new(waypoints: Vec<Vec2>, owner: &str) -> Result<Self> {
        if waypoints.is_empty() {
            return Err(SkirmishError::EmptyPatrolRoute(owner.to_string()));
        }
        Ok(Self { waypoints, index: 0 })
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn current(&self) -> Vec2 {
        self.waypoints[self.index]
    }

    /// Step to the next waypoint, wrapping to the start
    pub fn advance(&mut self) -> Vec2 {
        self.index = (self.index + 1) % self.waypoints.len();
        self.current()
    }
}
