pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod state;
pub mod turn;
