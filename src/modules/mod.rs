pub mod action;
pub mod bot;
pub mod config;
pub mod goal;
pub mod grid;
pub mod log;
pub mod mapgen;
pub mod pathfinder;
pub mod player;
pub mod sim;
pub mod stats;
pub mod tile;
pub mod view;
