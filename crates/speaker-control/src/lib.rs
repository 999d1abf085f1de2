//! Control plane: named parameter get/set over HTTP, writing into the
//! engine's [`ParameterStore`](speaker_engine::ParameterStore).

pub mod error;
pub mod query;
pub mod routes;
pub mod server;

pub use error::{ControlError, Result};
pub use routes::{ControlState, Method, Reply};
pub use server::{ControlConfig, ControlServer};
