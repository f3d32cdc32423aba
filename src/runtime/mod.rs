pub mod coercion;
pub mod context;
pub mod environment;
pub mod heartbeat;
pub mod markup;
pub mod perthread;
pub mod request;
pub mod services;
pub mod settings;
