//! Form support: recorded actions, client data signing, validation state and validators.

pub mod action_stream;
pub mod client_data;
pub mod support;
pub mod tracker;
pub mod validation;
