pub mod class_def;
pub mod component_model;
pub mod render_phase;
