//! Mobility models.

use crate::context::BuildContext;
use crate::entry::{self, Entry};
use crate::error::BuildError;
use crate::model::{Mobility, MobilityKind, Vector3, Waypoint};
use crate::utils::SimTime;
use log::debug;
use serde::Deserialize;

/// Coordinates in meters; a missing axis is 0
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Position> for Vector3 {
    fn from(p: Position) -> Self {
        Vector3 { x: p.x, y: p.y, z: p.z }
    }
}

/// A waypoint as written in a document: time in seconds plus coordinates
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
struct WaypointEntry {
    time: f64,
    x: f64,
    y: f64,
    z: f64,
}

/// Initial position of a mobility entry
pub fn initial_position(entry: &Entry) -> Result<Vector3, BuildError> {
    let position: Position = entry::parse_required(entry, "position")?;
    Ok(position.into())
}

pub fn build_constant_position(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let node = entry::node_id(entry)?;
    let position = initial_position(entry)?;
    ctx.network_mut().install_mobility(
        node,
        Mobility {
            kind: MobilityKind::ConstantPosition,
            position,
            waypoints: Vec::new(),
        },
    )?;
    debug!("Node {} fixed at ({}, {}, {})", node, position.x, position.y, position.z);
    Ok(())
}

/// Waypoint model; waypoint times must not decrease
pub fn build_waypoint(entry: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    let node = entry::node_id(entry)?;
    let position = initial_position(entry)?;
    let declared: Vec<WaypointEntry> = entry::parse_required(entry, "waypoints")?;

    let mut waypoints: Vec<Waypoint> = Vec::with_capacity(declared.len());
    for w in declared {
        let time = SimTime::try_from_secs_f64(w.time).map_err(|e| BuildError::invalid("waypoints.time", e))?;
        if let Some(last) = waypoints.last() {
            if time < last.time {
                return Err(BuildError::invalid(
                    "waypoints.time",
                    format!("waypoint at {} comes after one at {}", time, last.time),
                ));
            }
        }
        waypoints.push(Waypoint {
            time,
            position: Vector3 { x: w.x, y: w.y, z: w.z },
        });
    }

    debug!("Node {} follows {} waypoint(s)", node, waypoints.len());
    ctx.network_mut().install_mobility(
        node,
        Mobility {
            kind: MobilityKind::Waypoint,
            position,
            waypoints,
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::context_at;
    use crate::context::Stage;
    use crate::model::{ModelError, Network};
    use serde_json::json;

    fn one_node() -> Network {
        let mut network = Network::new();
        network.add_node(0).unwrap();
        network
    }

    #[test]
    fn test_constant_position_defaults_missing_axes() {
        let mut network = one_node();
        let mut ctx = context_at(&mut network, Stage::Mobility);
        build_constant_position(&json!({"nodeId": 0, "position": {"x": 3.0}}), &mut ctx).unwrap();

        let mobility = network.node(0).unwrap().mobility.clone().unwrap();
        assert_eq!(mobility.kind, MobilityKind::ConstantPosition);
        assert_eq!(mobility.position, Vector3 { x: 3.0, y: 0.0, z: 0.0 });
    }

    #[test]
    fn test_mobility_installed_once() {
        let mut network = one_node();
        let mut ctx = context_at(&mut network, Stage::Mobility);
        let entry = json!({"nodeId": 0, "position": {}});
        build_constant_position(&entry, &mut ctx).unwrap();
        assert!(matches!(
            build_constant_position(&entry, &mut ctx),
            Err(BuildError::Model(ModelError::MobilityInstalled(0)))
        ));
    }

    #[test]
    fn test_waypoints() {
        let mut network = one_node();
        let mut ctx = context_at(&mut network, Stage::Mobility);
        let entry = json!({
            "nodeId": 0,
            "position": {"x": 0.0, "y": 0.0},
            "waypoints": [
                {"time": 1.0, "x": 10.0},
                {"time": 1.0, "x": 10.0, "y": 5.0},
                {"time": 2.5, "x": 20.0}
            ]
        });
        build_waypoint(&entry, &mut ctx).unwrap();

        let mobility = network.node(0).unwrap().mobility.clone().unwrap();
        assert_eq!(mobility.waypoints.len(), 3);
        assert_eq!(mobility.waypoints[2].time, SimTime::from_nanos(2_500_000_000));
    }

    #[test]
    fn test_waypoints_out_of_order() {
        let mut network = one_node();
        let mut ctx = context_at(&mut network, Stage::Mobility);
        let entry = json!({
            "nodeId": 0,
            "position": {},
            "waypoints": [{"time": 5.0}, {"time": 4.0}]
        });
        assert!(matches!(
            build_waypoint(&entry, &mut ctx),
            Err(BuildError::InvalidField { field, .. }) if field == "waypoints.time"
        ));
        assert!(network.node(0).unwrap().mobility.is_none());
    }
}
