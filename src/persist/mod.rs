//! Persistent field values across requests.

pub mod manager;
