//! Per-tick aggregate computation.

use std::collections::HashSet;

use cellflow_core::VehicleId;
use cellflow_fleet::Fleet;
use cellflow_net::Network;

/// Aggregates over the on-road population at a tick boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickStats {
    /// Vehicles present in at least one cell container.
    pub on_road: usize,
    /// Mean velocity of the on-road population; 0 when empty.
    pub average_speed: f64,
    /// On-road count over the network's total capacity-equivalent cells.
    pub density: f64,
}

impl TickStats {
    /// Scan every cell container and fold the union into aggregates.
    ///
    /// The scan is the source of truth (rather than the registry's active
    /// set) so the stats would surface any drift between containers and
    /// registry membership.
    pub fn collect(net: &Network, fleet: &Fleet) -> TickStats {
        let mut on_road: HashSet<VehicleId> = HashSet::new();
        for cell in net.cells() {
            for vehicle in cell.container() {
                on_road.insert(vehicle);
            }
        }

        if on_road.is_empty() {
            return TickStats {
                on_road: 0,
                average_speed: 0.0,
                density: 0.0,
            };
        }

        let mut speed_sum = 0.0;
        for &id in &on_road {
            if let Some(handle) = fleet.vehicle(id) {
                speed_sum += handle.lock().unwrap().velocity() as f64;
            }
        }

        let total_capacity = net.total_capacity();
        TickStats {
            on_road: on_road.len(),
            average_speed: speed_sum / on_road.len() as f64,
            density: if total_capacity > 0.0 {
                on_road.len() as f64 / total_capacity
            } else {
                0.0
            },
        }
    }
}
