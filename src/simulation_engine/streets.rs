use std::fmt;

use crate::simulation_engine::intersections::IntersectionId;

/// Index of a street inside its [`RoadNetwork`](crate::simulation_engine::map::RoadNetwork).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreetId(pub usize);

impl fmt::Display for StreetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A road segment connecting two intersections.
///
/// Streets are undirected: vehicles travel them in either direction, and the
/// `from`/`to` naming only records construction order. Endpoints are plain
/// ids resolved through the owning network, so streets and intersections
/// never hold references to each other.
#[derive(Debug, Clone)]
pub struct Street {
    pub id: StreetId,
    pub from: IntersectionId,
    pub to: IntersectionId,
    /// Segment length in map units (straight-line distance between endpoints).
    pub length: f64,
}

impl Street {
    pub fn new(id: StreetId, from: IntersectionId, to: IntersectionId, length: f64) -> Self {
        Self {
            id,
            from,
            to,
            length,
        }
    }

    pub fn touches(&self, node: IntersectionId) -> bool {
        self.from == node || self.to == node
    }

    /// The endpoint opposite to `node`.
    ///
    /// Panics if `node` is not an endpoint of this street; the road network
    /// only hands out streets attached to the node being queried.
    pub fn other_end(&self, node: IntersectionId) -> IntersectionId {
        if self.from == node {
            self.to
        } else if self.to == node {
            self.from
        } else {
            panic!("street {} does not touch intersection {}", self.id, node);
        }
    }
}
