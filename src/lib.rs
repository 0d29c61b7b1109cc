pub mod algorithm;
pub mod common;
pub mod config;
pub mod heuristic;
pub mod map;
pub mod render;
pub mod stat;
