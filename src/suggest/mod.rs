pub mod backend;
pub mod heuristic;
pub mod merge;
pub mod orchestrator;
pub mod relevance;
pub mod suggest_model;
