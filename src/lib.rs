pub mod api;
pub mod config;
pub mod logicware;
pub mod mantra;
pub mod relay;
