//! Event dispatch: component events, handler methods, links and request handling.

pub mod event;
pub mod handler;
pub mod link;
pub mod request_handler;
