//! Concurrent traffic simulation.
//!
//! Vehicles run on their own threads and cross shared intersections one at a
//! time, gated by autonomously cycling signal lights. The admission protocol
//! lives in [`control_system`] on top of the blocking channel primitive in
//! [`concurrency`]; [`simulation_engine`] provides the road network and the
//! vehicle driver threads; [`monitoring`] and [`rendering`] observe the
//! simulation through read-only queries without participating in it.

pub mod concurrency;
pub mod control_system;
pub mod error;
pub mod monitoring;
pub mod rendering;
pub mod simulation_engine;
