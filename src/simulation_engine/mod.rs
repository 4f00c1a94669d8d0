pub mod intersections;
pub mod map;
pub mod simulation;
pub mod streets;
pub mod vehicles;
