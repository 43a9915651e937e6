//! Domain types and the ports the application layer is wired through.

pub mod booking;
pub mod ports;
pub mod session;
pub mod show;
