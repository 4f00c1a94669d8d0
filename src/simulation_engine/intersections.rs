use std::fmt;

/// Index of an intersection inside its [`RoadNetwork`](crate::simulation_engine::map::RoadNetwork).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntersectionId(pub usize);

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the road network, positioned in map pixel coordinates.
#[derive(Debug, Clone)]
pub struct IntersectionNode {
    pub id: IntersectionId,
    pub x: f64,
    pub y: f64,
}

impl IntersectionNode {
    pub fn new(id: IntersectionId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }
}
