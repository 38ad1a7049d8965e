// Library exports for the RWS simulator

pub mod controller;
pub mod server;

pub use controller::{ControllerState, ExecState, Resource};
pub use server::{router, serve, SharedState};
