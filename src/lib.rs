pub mod autopilot;
pub mod constants;
pub mod grid;
pub mod logging;
pub mod maze;
pub mod pathfinding;
pub mod player;
pub mod pursuer;
pub mod rng;
pub mod session;
pub mod types;
