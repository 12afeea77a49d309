pub mod balance;
pub mod calendar;
pub mod catalog;
pub mod economy;
pub mod engine;
pub mod environment;
pub mod observer;
pub mod plot;
pub mod report;
pub mod rng;
pub mod runner;
pub mod save;
pub mod scenario;
pub mod scoring;
pub mod snapshot;
pub mod systems;
pub mod web;
pub mod world;

pub use engine::{Command, EngineBuilder, EngineError, TurnEngine};
pub use world::{Farm, GameMode, Phase};
