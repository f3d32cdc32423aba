//! Class transformation: workers rewrite field access and advise methods, producing
//! a [`transformed::TransformedClass`] per component class.

pub mod advice;
pub mod class;
pub mod component_class;
pub mod conduit;
pub mod registry;
pub mod transformed;
pub mod worker;
