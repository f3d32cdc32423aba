#![forbid(unsafe_code)]

pub mod app;
pub mod components;
pub mod dispatch;
pub mod form;
pub mod foundation;
pub mod model;
pub mod page;
pub mod persist;
pub mod render;
pub mod runtime;
pub mod transform;
pub mod workers;

pub use app::{Application, ApplicationBuilder};
pub use dispatch::event::ComponentEvent;
pub use dispatch::link::{EventRequest, Link};
pub use dispatch::request_handler::Response;
pub use form::client_data::ClientDataEncoder;
pub use form::tracker::ValidationTracker;
pub use foundation::error::{TapestryError, TapestryResult};
pub use foundation::ids::{ElementIdx, InstanceLocator};
pub use foundation::orderer::Orderer;
pub use foundation::value::{Value, ValueType};
pub use model::class_def::{
    Annotation, ClassDef, ClassKind, ComponentAnn, FieldDef, MethodDef, ParamDef, ParameterAnn,
};
pub use model::component_model::{ComponentModel, MutableComponentModel, ParameterModel};
pub use model::render_phase::RenderPhase;
pub use page::context::ComponentContext;
pub use page::template::{ElementSpec, NodeSpec};
pub use page::tree::Page;
pub use runtime::request::{MemorySession, Request, Session, TestRequest};
pub use runtime::settings::Settings;
pub use transform::component_class::ComponentClass;
