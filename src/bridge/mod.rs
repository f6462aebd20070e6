// * Local Query Service: read-only HTTP views over the pollers' files

pub mod health;
pub mod routes;
pub mod server;

pub use routes::{route, BridgeState, StatusReport};
pub use server::{bind, serve, BridgeError};
