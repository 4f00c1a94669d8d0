use crate::simulation_engine::intersections::{IntersectionId, IntersectionNode};
use crate::simulation_engine::streets::{Street, StreetId};

/// The street/intersection connectivity graph.
///
/// The network is the single owner of every node and segment; everything else
/// refers to them by id. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    intersections: Vec<IntersectionNode>,
    streets: Vec<Street>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_intersection(&mut self, x: f64, y: f64) -> IntersectionId {
        let id = IntersectionId(self.intersections.len());
        self.intersections.push(IntersectionNode::new(id, x, y));
        id
    }

    /// Connects two intersections; the street length is their straight-line
    /// distance in map units.
    pub fn add_street(&mut self, a: IntersectionId, b: IntersectionId) -> StreetId {
        let id = StreetId(self.streets.len());
        let (na, nb) = (self.intersection(a), self.intersection(b));
        let length = ((na.x - nb.x).powi(2) + (na.y - nb.y).powi(2)).sqrt();
        self.streets.push(Street::new(id, a, b, length));
        id
    }

    pub fn intersection(&self, id: IntersectionId) -> &IntersectionNode {
        &self.intersections[id.0]
    }

    pub fn street(&self, id: StreetId) -> &Street {
        &self.streets[id.0]
    }

    pub fn intersections(&self) -> &[IntersectionNode] {
        &self.intersections
    }

    pub fn streets(&self) -> &[Street] {
        &self.streets
    }

    /// All streets attached to `node`.
    pub fn streets_at(&self, node: IntersectionId) -> Vec<StreetId> {
        self.streets
            .iter()
            .filter(|s| s.touches(node))
            .map(|s| s.id)
            .collect()
    }

    /// Streets a vehicle may continue on after crossing `node`, excluding the
    /// street it arrived on. Empty at a dead end; the caller decides whether
    /// to turn around.
    pub fn outgoing(&self, node: IntersectionId, incoming: StreetId) -> Vec<StreetId> {
        self.streets
            .iter()
            .filter(|s| s.touches(node) && s.id != incoming)
            .map(|s| s.id)
            .collect()
    }
}

/// Paris layout: eight streets radiating from a central plaza.
pub fn create_paris_network() -> RoadNetwork {
    let mut network = RoadNetwork::new();

    let positions = [
        (385.0, 270.0),
        (1240.0, 80.0),
        (1625.0, 75.0),
        (2110.0, 75.0),
        (2840.0, 175.0),
        (3070.0, 680.0),
        (2800.0, 1400.0),
        (400.0, 1100.0),
        (1700.0, 900.0), // central plaza
    ];
    let nodes: Vec<_> = positions
        .iter()
        .map(|&(x, y)| network.add_intersection(x, y))
        .collect();

    let plaza = nodes[8];
    for &outer in &nodes[..8] {
        network.add_street(outer, plaza);
    }

    network
}

/// NYC layout: a ring of six intersections with one cross connection.
pub fn create_nyc_network() -> RoadNetwork {
    let mut network = RoadNetwork::new();

    let positions = [
        (1430.0, 625.0),
        (2575.0, 1260.0),
        (2200.0, 1950.0),
        (1000.0, 1350.0),
        (400.0, 1000.0),
        (750.0, 250.0),
    ];
    let nodes: Vec<_> = positions
        .iter()
        .map(|&(x, y)| network.add_intersection(x, y))
        .collect();

    for i in 0..6 {
        network.add_street(nodes[i], nodes[(i + 1) % 6]);
    }
    network.add_street(nodes[0], nodes[3]);

    network
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paris_plaza_connects_to_every_outer_intersection() {
        let network = create_paris_network();
        assert_eq!(network.intersections().len(), 9);
        assert_eq!(network.streets().len(), 8);

        let plaza = IntersectionId(8);
        assert_eq!(network.streets_at(plaza).len(), 8);
        for street in network.streets() {
            assert!(street.touches(plaza));
        }
    }

    #[test]
    fn outgoing_excludes_the_incoming_street() {
        let network = create_nyc_network();
        let node = IntersectionId(0);
        let attached = network.streets_at(node);
        assert_eq!(attached.len(), 3);

        let incoming = attached[0];
        let outgoing = network.outgoing(node, incoming);
        assert_eq!(outgoing.len(), 2);
        assert!(!outgoing.contains(&incoming));
        for id in outgoing {
            assert!(network.street(id).touches(node));
        }
    }

    #[test]
    fn dead_end_has_no_outgoing_streets() {
        let network = create_paris_network();
        let outer = IntersectionId(0);
        let attached = network.streets_at(outer);
        assert_eq!(attached.len(), 1);
        assert!(network.outgoing(outer, attached[0]).is_empty());
    }

    #[test]
    fn street_length_is_endpoint_distance() {
        let mut network = RoadNetwork::new();
        let a = network.add_intersection(0.0, 0.0);
        let b = network.add_intersection(300.0, 400.0);
        let s = network.add_street(a, b);
        assert!((network.street(s).length - 500.0).abs() < 1e-9);
        assert_eq!(network.street(s).other_end(a), b);
        assert_eq!(network.street(s).other_end(b), a);
    }
}
