//! Page structure: component instances, their resources and bindings, and page assembly.

pub mod assembler;
pub mod binding;
pub mod context;
pub mod instance;
pub mod lifecycle;
pub mod resources;
pub mod source;
pub mod template;
pub mod tree;
