//! Unit tests for the network data model.

use cellflow_core::{CellId, SimRng, VehicleId};

use crate::cell::BufferEntry;
use crate::error::NetError;
use crate::light::TrafficLight;
use crate::network::NetworkBuilder;
use crate::topology;

#[cfg(test)]
mod cell_tests {
    use super::*;

    fn single_cell() -> crate::Network {
        let mut b = NetworkBuilder::new();
        b.add_cell(5, 1.0);
        b.build()
    }

    #[test]
    fn load_and_unload_track_occupation() {
        let net = single_cell();
        let cell = net.cell(CellId(0));

        assert!(cell.loadable(1.0));
        cell.load(VehicleId(1), 1.0).unwrap();
        assert_eq!(cell.occupation(), 1.0);
        assert_eq!(cell.vehicle_count(), 1);
        assert!(cell.contains(VehicleId(1)));

        cell.unload(VehicleId(1)).unwrap();
        assert_eq!(cell.occupation(), 0.0);
        assert!(!cell.contains(VehicleId(1)));
    }

    #[test]
    fn load_rejects_over_capacity() {
        let net = single_cell();
        let cell = net.cell(CellId(0));

        cell.load(VehicleId(1), 0.6).unwrap();
        let err = cell.load(VehicleId(2), 0.6).unwrap_err();
        assert!(matches!(err, NetError::CapacityExceeded { .. }));
        // The loser saw the committed occupation and changed nothing.
        assert_eq!(cell.occupation(), 0.6);
        assert_eq!(cell.vehicle_count(), 1);
    }

    #[test]
    fn fractional_occupies_share_a_cell() {
        let net = single_cell();
        let cell = net.cell(CellId(0));
        cell.load(VehicleId(1), 0.4).unwrap();
        cell.load(VehicleId(2), 0.4).unwrap();
        assert!(!cell.loadable(0.4));
        assert!(cell.loadable(0.2));
    }

    #[test]
    fn unload_missing_vehicle_errors() {
        let net = single_cell();
        let err = net.cell(CellId(0)).unload(VehicleId(9)).unwrap_err();
        assert!(matches!(err, NetError::NotPresent { .. }));
    }

    #[test]
    fn buffer_is_fifo_and_removal_targets_first_match() {
        let net = single_cell();
        let cell = net.cell(CellId(0));

        cell.buffer_push(BufferEntry { vehicle: VehicleId(1), occupy: 1.0 });
        cell.buffer_push(BufferEntry { vehicle: VehicleId(2), occupy: 1.0 });
        cell.buffer_push(BufferEntry { vehicle: VehicleId(3), occupy: 1.0 });

        let order: Vec<_> = cell.buffer_snapshot().iter().map(|e| e.vehicle).collect();
        assert_eq!(order, vec![VehicleId(1), VehicleId(2), VehicleId(3)]);

        cell.buffer_remove(VehicleId(2)).unwrap();
        let order: Vec<_> = cell.buffer_snapshot().iter().map(|e| e.vehicle).collect();
        assert_eq!(order, vec![VehicleId(1), VehicleId(3)]);

        let err = cell.buffer_remove(VehicleId(2)).unwrap_err();
        assert!(matches!(err, NetError::NotInBuffer { .. }));
    }

    #[test]
    fn concurrent_loads_never_exceed_capacity() {
        use std::sync::Arc;

        let mut b = NetworkBuilder::new();
        b.add_cell(5, 3.0);
        let net = Arc::new(b.build());

        // 16 threads race 64 vehicles of occupy 1.0 onto a capacity-3 cell.
        let handles: Vec<_> = (0..16)
            .map(|t| {
                let net = Arc::clone(&net);
                std::thread::spawn(move || {
                    for i in 0..4 {
                        let _ = net.cell(CellId(0)).load(VehicleId(t * 4 + i), 1.0);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let cell = net.cell(CellId(0));
        assert!(cell.occupation() <= 3.0, "occupation {}", cell.occupation());
        assert_eq!(cell.vehicle_count(), 3);
    }
}

#[cfg(test)]
mod light_tests {
    use super::*;

    #[test]
    fn rejects_invalid_windows() {
        assert!(TrafficLight::new(0, (0, 1)).is_err());
        assert!(TrafficLight::new(10, (5, 5)).is_err());
        assert!(TrafficLight::new(10, (0, 11)).is_err());
        assert!(TrafficLight::new(10, (0, 10)).is_ok());
    }

    #[test]
    fn full_period_revisits_counter_and_green_share() {
        let light = TrafficLight::new(6, (2, 5)).unwrap();
        light.set_counter(3).unwrap();
        let c0 = light.counter();

        let mut greens = 0;
        for _ in 0..6 {
            light.cycle();
            if light.phase() {
                greens += 1;
            }
        }
        assert_eq!(light.counter(), c0);
        // Green exactly hi - lo = 3 of the 6 steps.
        assert_eq!(greens, 3);
    }

    #[test]
    fn phase_follows_window() {
        let light = TrafficLight::new(4, (2, 4)).unwrap();
        light.set_counter(1).unwrap();
        assert!(!light.phase());

        light.cycle(); // counter 2: still red, window is (2, 4]
        assert!(!light.phase());
        light.cycle(); // counter 3: green
        assert!(light.phase());
        light.cycle(); // counter 4: green
        assert!(light.phase());
        light.cycle(); // wraps to 1: red
        assert_eq!(light.counter(), 1);
        assert!(!light.phase());
    }

    #[test]
    fn red_light_blocks_loading_regardless_of_capacity() {
        let mut b = NetworkBuilder::new();
        let id = b.add_light(5, 1.0, 4, (2, 4)).unwrap();
        let net = b.build();
        let cell = net.cell(id);

        cell.light().unwrap().set_counter(1).unwrap();
        assert!(!cell.loadable(0.1));

        cell.light().unwrap().set_counter(3).unwrap();
        assert!(cell.loadable(0.1));
    }

    #[test]
    fn change_interval_scales_and_clamps() {
        let light = TrafficLight::new(10, (2, 6)).unwrap();
        light.set_counter(9).unwrap();

        light.change_interval(0.5).unwrap();
        assert_eq!(light.period(), 5);
        assert_eq!(light.green_window(), (1, 3));
        assert_eq!(light.counter(), 4);

        light.change_interval(2.0).unwrap();
        assert_eq!(light.period(), 10);
        assert_eq!(light.green_window(), (2, 6));

        assert!(light.change_interval(0.0).is_err());
        assert!(light.change_interval(-1.0).is_err());
    }

    #[test]
    fn change_interval_clamps_counter_into_period() {
        let light = TrafficLight::new(10, (2, 9)).unwrap();
        light.set_counter(10).unwrap();
        light.change_interval(0.31).unwrap();
        // period = 3, counter = trunc(10 * 0.31) = 3 stays in range.
        assert_eq!(light.period(), 3);
        assert!(light.counter() >= 1 && light.counter() <= 3);
    }
}

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn csr_adjacency_and_degrees() {
        let mut b = NetworkBuilder::new();
        let n0 = b.add_cell(5, 1.0);
        let n1 = b.add_cell(5, 1.0);
        let n2 = b.add_cell(5, 1.0);
        b.add_edge(n0, n2);
        b.add_edge(n0, n1);
        b.add_edge(n1, n2);
        let net = b.build();

        assert_eq!(net.successors(n0), &[n1, n2]);
        assert_eq!(net.successors(n2), &[] as &[CellId]);
        assert_eq!(net.predecessors(n2), &[n0, n1]);
        assert_eq!(net.in_degree(n2), 2);
        assert_eq!(net.out_degree(n0), 2);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut b = NetworkBuilder::new();
        let n0 = b.add_cell(5, 1.0);
        let n1 = b.add_cell(5, 1.0);
        b.add_edge(n0, n1);
        b.add_edge(n0, n1);
        let net = b.build();
        assert_eq!(net.edge_count(), 1);
        assert_eq!(net.in_degree(n1), 1);
    }

    #[test]
    fn links_flatten_and_chain() {
        let mut b = NetworkBuilder::new();
        let head = b.add_cell(5, 1.0);
        let tail = b.add_cell(5, 1.0);
        let link = b.add_link(3, 4, 2.0).unwrap();
        b.connect_to_link(head, link);
        b.connect_from_link(link, tail);
        let net = b.build();

        let cells = net.link(link).cells();
        assert_eq!(cells.len(), 3);
        assert_eq!(net.link(link).entry(), cells[0]);
        assert_eq!(net.link(link).exit(), cells[2]);
        // head → entry → middle → exit → tail
        assert_eq!(net.successors(head), &[cells[0]]);
        assert_eq!(net.successors(cells[0]), &[cells[1]]);
        assert_eq!(net.successors(cells[2]), &[tail]);
        assert_eq!(net.cell(cells[1]).max_speed(), 4);
        assert_eq!(net.cell(cells[1]).capacity(), 2.0);
    }

    #[test]
    fn link_shorter_than_two_cells_rejected() {
        let mut b = NetworkBuilder::new();
        assert!(b.add_link(1, 5, 1.0).is_err());
    }

    #[test]
    fn ring_is_strongly_connected_but_line_is_not() {
        let mut b = NetworkBuilder::new();
        let ids: Vec<_> = (0..4).map(|_| b.add_cell(5, 1.0)).collect();
        for pair in ids.windows(2) {
            b.add_edge(pair[0], pair[1]);
        }
        let line = b.build();
        assert!(!line.is_strongly_connected());
        assert!(!line.unreachable_pairs().is_empty());

        let mut b = NetworkBuilder::new();
        let ids: Vec<_> = (0..4).map(|_| b.add_cell(5, 1.0)).collect();
        for pair in ids.windows(2) {
            b.add_edge(pair[0], pair[1]);
        }
        b.add_edge(ids[3], ids[0]);
        let ring = b.build();
        assert!(ring.is_strongly_connected());
        assert!(ring.unreachable_pairs().is_empty());
    }

    #[test]
    fn capacity_aggregates() {
        let mut b = NetworkBuilder::new();
        b.add_cell(5, 1.0);
        b.add_cell(5, 3.0);
        let net = b.build();
        assert_eq!(net.total_capacity(), 4.0);
        assert_eq!(net.avg_capacity(), 2.0);
    }
}

#[cfg(test)]
mod topology_tests {
    use super::*;

    #[test]
    fn cycle_layout() {
        let mut rng = SimRng::new(42);
        let net = topology::cycle(100, 10, 60, &mut rng).unwrap();

        assert_eq!(net.cell_count(), 100);
        assert_eq!(net.edge_count(), 100);
        assert_eq!(net.lights().len(), 10);
        assert!(net.is_strongly_connected());

        // Lights sit on every 10th cell.
        for (i, &id) in net.lights().iter().enumerate() {
            assert_eq!(id, CellId(i as u32 * 10));
        }

        // Green shares alternate 0.3 / 0.7 of the period.
        let (lo0, hi0) = net.cell(net.lights()[0]).light().unwrap().green_window();
        let (lo1, hi1) = net.cell(net.lights()[1]).light().unwrap().green_window();
        assert_eq!((lo0, hi0), (0, 18));
        assert_eq!((lo1, hi1), (0, 42));
    }

    #[test]
    fn cycle_light_counters_are_randomized() {
        let mut rng = SimRng::new(7);
        let net = topology::cycle(400, 20, 120, &mut rng).unwrap();
        let counters: Vec<u32> = net
            .lights()
            .iter()
            .map(|&id| net.cell(id).light().unwrap().counter())
            .collect();
        assert!(counters.iter().all(|&c| (1..=120).contains(&c)));
        // 20 independent draws from [1, 120] collapsing to one value is
        // astronomically unlikely.
        assert!(counters.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn star_ring_layout() {
        let mut rng = SimRng::new(42);
        let net = topology::star_ring(3, 2, 40, &mut rng).unwrap();

        assert_eq!(net.cell_count(), 5 + 8 * 3 + 8 * 2);
        assert!(net.is_strongly_connected());
        assert_eq!(net.lights().len(), 4);

        // The four inbound lights split the period into quarters, the last
        // extended to the period end.
        let windows: Vec<(u32, u32)> = net
            .lights()
            .iter()
            .map(|&id| net.cell(id).light().unwrap().green_window())
            .collect();
        assert_eq!(windows, vec![(0, 10), (10, 20), (20, 30), (30, 40)]);
    }

    #[test]
    fn center_hub_is_an_intersection() {
        let mut rng = SimRng::new(1);
        let net = topology::star_ring(2, 2, 40, &mut rng).unwrap();
        // Four inbound spokes terminate at the center hub (cell 4).
        assert_eq!(net.in_degree(CellId(4)), 4);
        assert_eq!(net.out_degree(CellId(4)), 4);
    }

    #[test]
    fn invalid_parameters_rejected() {
        let mut rng = SimRng::new(0);
        assert!(topology::cycle(0, 1, 10, &mut rng).is_err());
        assert!(topology::cycle(10, 0, 10, &mut rng).is_err());
        assert!(topology::cycle(10, 1, 0, &mut rng).is_err());
        assert!(topology::star_ring(0, 1, 10, &mut rng).is_err());
        assert!(topology::star_ring(1, 1, 3, &mut rng).is_err());
    }
}
