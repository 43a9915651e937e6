//! Inbound and outbound adapters (CSV script driver and report).

pub mod csv;
