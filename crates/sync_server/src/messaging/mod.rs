//! Message handling and routing for client-server communication.
//!
//! This module defines the JSON wire protocol and the routing of decoded
//! client messages into the session layer.

pub mod router;
pub mod types;

pub use router::route_client_message;
pub use types::{ClientMessage, ServerEvent};
