//! Network layer: port reachability

pub mod socket;

pub use socket::{PortProber, TcpConnectProber};
