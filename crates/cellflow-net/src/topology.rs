//! Synthetic network topologies.
//!
//! Two generators cover the study configurations: a single directed ring
//! with periodic traffic lights, and a star-ring hybrid (four hub cells in a
//! bidirectional ring around a central hub, with signalized inbound spokes).
//!
//! All generated cells use `max_speed = 5` and `capacity = 1.0`.

use cellflow_core::SimRng;

use crate::error::{NetError, NetResult};
use crate::network::{Network, NetworkBuilder};

const CELL_SPEED: u32 = 5;
const CELL_CAPACITY: f64 = 1.0;

/// Build a directed ring of `num_cells` cells where every
/// `light_interval`-th cell is a traffic light.
///
/// Lights alternate green ratios of 0.3 and 0.7 of `init_period`, and each
/// light's counter starts at a random position so phases are de-synchronized
/// across the ring.
pub fn cycle(
    num_cells: usize,
    light_interval: usize,
    init_period: u32,
    rng: &mut SimRng,
) -> NetResult<Network> {
    if num_cells == 0 {
        return Err(NetError::Topology("cycle needs at least one cell".into()));
    }
    if light_interval == 0 {
        return Err(NetError::Topology("light interval must be positive".into()));
    }
    if init_period == 0 {
        return Err(NetError::Topology("light period must be positive".into()));
    }

    let mut builder = NetworkBuilder::with_capacity(num_cells, num_cells);
    let mut light_count = 0usize;

    let mut ids = Vec::with_capacity(num_cells);
    for i in 0..num_cells {
        if i % light_interval == 0 {
            // Alternate short and long green shares around the ring.
            let green_ratio = if light_count % 2 == 0 { 0.3 } else { 0.7 };
            let green_hi = ((init_period as f64 * green_ratio).round() as u32)
                .clamp(1, init_period);
            let id = builder.add_light(CELL_SPEED, CELL_CAPACITY, init_period, (0, green_hi))?;
            light_count += 1;
            ids.push(id);
        } else {
            ids.push(builder.add_cell(CELL_SPEED, CELL_CAPACITY));
        }
    }

    for pair in ids.windows(2) {
        builder.add_edge(pair[0], pair[1]);
    }
    builder.add_edge(ids[num_cells - 1], ids[0]);

    let net = builder.build();
    randomize_light_counters(&net, init_period, rng)?;
    Ok(net)
}

/// Build the star-ring hybrid: hubs A–D in a bidirectional ring around a
/// central hub E, with `ring_cells` intermediate cells per ring direction and
/// `star_cells` per spoke direction.
///
/// The last cell of each inbound spoke (hub → center) is a traffic light;
/// the four lights share `init_period` and split it into consecutive quarter
/// green windows, the fourth extended to cover the period remainder.
pub fn star_ring(
    ring_cells: usize,
    star_cells: usize,
    init_period: u32,
    rng: &mut SimRng,
) -> NetResult<Network> {
    if ring_cells == 0 || star_cells == 0 {
        return Err(NetError::Topology(
            "star-ring needs at least one cell per direction".into(),
        ));
    }
    if init_period < 4 {
        return Err(NetError::Topology(
            "star-ring needs a light period of at least 4".into(),
        ));
    }

    let total = 5 + 8 * ring_cells + 8 * star_cells;
    let mut builder = NetworkBuilder::with_capacity(total, total + 16);

    let a = builder.add_cell(CELL_SPEED, CELL_CAPACITY);
    let b = builder.add_cell(CELL_SPEED, CELL_CAPACITY);
    let c = builder.add_cell(CELL_SPEED, CELL_CAPACITY);
    let d = builder.add_cell(CELL_SPEED, CELL_CAPACITY);
    let e = builder.add_cell(CELL_SPEED, CELL_CAPACITY);

    // (from, to, cell count, light window index for inbound spokes)
    let connections: [(_, _, usize, Option<u32>); 16] = [
        // Ring, clockwise.
        (a, b, ring_cells, None),
        (b, c, ring_cells, None),
        (c, d, ring_cells, None),
        (d, a, ring_cells, None),
        // Ring, counter-clockwise.
        (b, a, ring_cells, None),
        (c, b, ring_cells, None),
        (d, c, ring_cells, None),
        (a, d, ring_cells, None),
        // Spokes, inbound (signalized at the approach to the center).
        (a, e, star_cells, Some(0)),
        (b, e, star_cells, Some(1)),
        (c, e, star_cells, Some(2)),
        (d, e, star_cells, Some(3)),
        // Spokes, outbound.
        (e, a, star_cells, None),
        (e, b, star_cells, None),
        (e, c, star_cells, None),
        (e, d, star_cells, None),
    ];

    for (from, to, count, light_index) in connections {
        let mut prev = from;
        for j in 0..count {
            let cell = match light_index {
                // The final approach cell carries the light.
                Some(i) if j == count - 1 => {
                    let quarter = init_period / 4;
                    let lo = i * quarter;
                    let hi = if i == 3 { init_period } else { (i + 1) * quarter };
                    builder.add_light(CELL_SPEED, CELL_CAPACITY, init_period, (lo, hi))?
                }
                _ => builder.add_cell(CELL_SPEED, CELL_CAPACITY),
            };
            builder.add_edge(prev, cell);
            prev = cell;
        }
        builder.add_edge(prev, to);
    }

    let net = builder.build();
    randomize_light_counters(&net, init_period, rng)?;
    Ok(net)
}

/// Start every light at a random counter position so phases are spread out.
fn randomize_light_counters(net: &Network, period: u32, rng: &mut SimRng) -> NetResult<()> {
    for &id in net.lights() {
        let counter = if period > 1 {
            rng.between(1, period)
        } else {
            1
        };
        net.cell(id)
            .light()
            .expect("light list entry without light state")
            .set_counter(counter)?;
    }
    Ok(())
}
