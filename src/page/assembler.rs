use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::ids::{ElementIdx, IdAllocator, InstanceLocator};
use crate::foundation::orderer::Orderer;
use crate::model::class_def::ClassKind;
use crate::model::component_model::{EmbeddedComponentModel, MixinRef, ParameterModel};
use crate::page::instance::ComponentInstance;
use crate::page::resources::ComponentResources;
use crate::page::template::{ElementSpec, NodeSpec};
use crate::page::tree::{Page, PageElement, TemplateNode};
use crate::runtime::context::RequestContext;
use crate::runtime::services::Services;
use crate::transform::registry::ClassRegistry;
use crate::transform::transformed::TransformedClass;
use crate::workers::component::mixin_id;

const INHERIT_PREFIX: &str = "inherit:";

/// Builds a [`Page`] from its page class: instantiates the page, walks templates to create
/// embedded components and their mixins, then binds parameters.
pub struct PageAssembler<'r> {
    registry: &'r ClassRegistry,
    services: Arc<Services>,
    page_name: String,
    elements: Vec<PageElement>,
    ids: HashMap<ElementIdx, IdAllocator>,
}

impl<'r> PageAssembler<'r> {
    pub fn new(registry: &'r ClassRegistry) -> Self {
        Self {
            registry,
            services: registry.services().clone(),
            page_name: String::new(),
            elements: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Assembles the page and runs did-load on every instance.
    pub fn assemble(mut self, class_name: &str) -> TapestryResult<Page> {
        let class = self.registry.transformed(class_name)?;
        if class.def().kind != ClassKind::Page {
            return Err(TapestryError::config(format!("{class_name} is not a page class")));
        }
        self.page_name = class.def().simple_name().to_string();
        let location = class_name.to_string();
        let root = self.create_element(None, "", location, class, Vec::new())?;
        self.build_template(root)?;

        let page = Page {
            name: self.page_name,
            class_name: class_name.to_string(),
            elements: self.elements,
            services: self.services.clone(),
        };
        if self.services.settings().unknown_component_id_check {
            check_event_handlers(&page)?;
        }
        let mut rc = RequestContext::detached(self.services.clone());
        page.did_load(&mut rc)?;
        tracing::debug!(page = %page.name, elements = page.elements.len(), "page assembled");
        Ok(page)
    }

    fn element(&self, idx: ElementIdx) -> &PageElement {
        &self.elements[idx.index()]
    }

    fn create_element(
        &mut self,
        container: Option<ElementIdx>,
        id: &str,
        location: String,
        class: Arc<TransformedClass>,
        extra_mixins: Vec<MixinRef>,
    ) -> TapestryResult<ElementIdx> {
        let idx = ElementIdx(self.elements.len() as u32);
        let nested_id = match container {
            None => String::new(),
            Some(c) if self.element(c).nested_id.is_empty() => id.to_string(),
            Some(c) => format!("{}.{id}", self.element(c).nested_id),
        };
        let complete_id = if nested_id.is_empty() {
            self.page_name.clone()
        } else {
            format!("{}:{nested_id}", self.page_name)
        };
        let resources = Arc::new(ComponentResources::new(
            id,
            &nested_id,
            &complete_id,
            &self.page_name,
            InstanceLocator::core(idx),
            class.model().clone(),
        ));
        let core = ComponentInstance::new(class.clone(), resources, &self.services)?;

        let mut refs: Vec<MixinRef> = class.model().mixin_classes().into_iter().cloned().collect();
        refs.extend(extra_mixins);
        let mut orderer = Orderer::new(format!("mixins of {complete_id}"));
        for mixin in &refs {
            let name = self.registry.mixin_class(&mixin.mixin_type)?.to_string();
            let mixin_class = self.registry.transformed(&name)?;
            if mixin_class.def().kind != ClassKind::Mixin {
                return Err(TapestryError::config(format!(
                    "{name} is used as a mixin of {complete_id} but is not a mixin class"
                )));
            }
            let mixin_id = mixin_class.def().simple_name().to_string();
            orderer.add(&mixin_id.clone(), (mixin_id, mixin_class), &mixin.constraints)?;
        }

        let mut mixins = Vec::with_capacity(refs.len());
        let mut before: SmallVec<[InstanceLocator; 2]> = SmallVec::new();
        let mut after: SmallVec<[InstanceLocator; 2]> = SmallVec::new();
        for (i, (mixin_id, mixin_class)) in orderer.order()?.into_iter().enumerate() {
            let locator = InstanceLocator::mixin(idx, i as u16);
            let resources = Arc::new(ComponentResources::new(
                &mixin_id,
                &nested_id,
                format!("{complete_id}${mixin_id}"),
                &self.page_name,
                locator,
                mixin_class.model().clone(),
            ));
            if mixin_class.model().is_mixin_after() {
                after.push(locator);
            } else {
                before.push(locator);
            }
            let instance = ComponentInstance::new(mixin_class, resources, &self.services)?;
            mixins.push((mixin_id, instance));
        }
        let mut participants = before;
        participants.push(InstanceLocator::core(idx));
        participants.extend(after);

        self.elements.push(PageElement {
            id: id.to_string(),
            nested_id,
            complete_id,
            location,
            container,
            children: Vec::new(),
            core,
            mixins,
            participants,
            template: Vec::new(),
            body: Vec::new(),
        });
        if let Some(c) = container {
            self.elements[c.index()].children.push(idx);
        }
        Ok(idx)
    }

    /// Converts the template of the element's class; components found in it are embedded
    /// with this element as their container.
    fn build_template(&mut self, owner: ElementIdx) -> TapestryResult<()> {
        let class = self.element(owner).core.class().clone();
        let model = class.model().clone();
        let nodes = match class.template().cloned() {
            Some(specs) => {
                let nodes = self.convert(owner, &specs)?;
                let present: Vec<String> = self
                    .element(owner)
                    .children
                    .iter()
                    .map(|c| self.element(*c).id.to_ascii_lowercase())
                    .collect();
                let missing: Vec<&str> = model
                    .embedded_components()
                    .into_iter()
                    .filter(|e| !present.contains(&e.id.to_ascii_lowercase()))
                    .map(|e| e.id.as_str())
                    .collect();
                if !missing.is_empty() {
                    return Err(TapestryError::transform(
                        class.name(),
                        format!(
                            "embedded component(s) {} are declared by the class but not present \
                             in its template",
                            missing.join(", ")
                        ),
                    ));
                }
                nodes
            }
            None => {
                for embedded in model.embedded_components() {
                    self.embed(owner, &ElementSpec::id(&embedded.id))?;
                }
                if owner == ElementIdx::ROOT {
                    Vec::new()
                } else {
                    vec![TemplateNode::Body]
                }
            }
        };
        self.elements[owner.index()].template = nodes;
        Ok(())
    }

    fn convert(&mut self, owner: ElementIdx, specs: &[NodeSpec]) -> TapestryResult<Vec<TemplateNode>> {
        specs.iter().map(|s| self.convert_node(owner, s)).collect()
    }

    fn convert_node(&mut self, owner: ElementIdx, spec: &NodeSpec) -> TapestryResult<TemplateNode> {
        Ok(match spec {
            NodeSpec::Text { text } => TemplateNode::Text(text.clone()),
            NodeSpec::Element {
                name,
                attributes,
                children,
            } => TemplateNode::Element {
                name: name.clone(),
                attributes: attributes.clone(),
                children: self.convert(owner, children)?,
            },
            NodeSpec::Expansion { expression } => {
                let description = format!("expansion in {}", self.element(owner).complete_id);
                TemplateNode::Expansion(self.services.bindings().new_binding(
                    &description,
                    InstanceLocator::core(owner),
                    "prop",
                    expression,
                )?)
            }
            NodeSpec::Body => TemplateNode::Body,
            NodeSpec::Component(element) => TemplateNode::Component(self.embed(owner, element)?),
        })
    }

    fn embed(&mut self, owner: ElementIdx, spec: &ElementSpec) -> TapestryResult<ElementIdx> {
        let owner_class = self.element(owner).core.class().clone();
        let declared: Option<EmbeddedComponentModel> = spec
            .id
            .as_deref()
            .and_then(|id| owner_class.model().embedded_component(id))
            .cloned();
        let declared_type = declared.as_ref().and_then(|d| d.component_type());
        let component_type = match (spec.component_type.as_deref(), declared_type) {
            (Some(t), Some(d)) if !t.eq_ignore_ascii_case(d) => {
                return Err(TapestryError::transform(
                    owner_class.name(),
                    format!(
                        "embedded component '{}' is declared with type {d} but the template \
                         gives type {t}",
                        spec.id.as_deref().unwrap_or_default()
                    ),
                ));
            }
            (Some(t), _) => t.to_string(),
            (None, Some(d)) => d.to_string(),
            (None, None) => {
                return Err(TapestryError::transform(
                    owner_class.name(),
                    match &spec.id {
                        Some(id) => format!(
                            "embedded component '{id}' has no type: the class does not declare \
                             it and the template names none"
                        ),
                        None => "component element has neither an id nor a type".to_string(),
                    },
                ));
            }
        };

        let allocator = self.ids.entry(owner).or_default();
        let id = match &spec.id {
            Some(id) if allocator.is_allocated(id) => {
                return Err(TapestryError::transform(
                    owner_class.name(),
                    format!("component id '{id}' is used more than once in the template"),
                ));
            }
            Some(id) => allocator.allocate(id),
            None => allocator.allocate(&mixin_id(&component_type).to_ascii_lowercase()),
        };

        let class_name = self.registry.component_class(&component_type)?.to_string();
        let class = self.registry.transformed(&class_name)?;
        if class.def().kind != ClassKind::Component {
            return Err(TapestryError::config(format!(
                "{class_name} is embedded as component '{id}' but is not a component class"
            )));
        }
        let mut mixins: Vec<MixinRef> = declared
            .as_ref()
            .map(|d| d.mixins.clone())
            .unwrap_or_default();
        mixins.extend(spec.mixins.iter().map(|m| MixinRef::parse(m)));

        let location = spec
            .location
            .clone()
            .unwrap_or_else(|| owner_class.name().to_string());
        let idx = self.create_element(Some(owner), &id, location, class, mixins)?;
        let body = self.convert(owner, &spec.body)?;
        self.elements[idx.index()].body = body;
        // Bound before the template is built so `inherit:` bindings inside it resolve.
        let published = self.bind_parameters(owner, idx, declared.as_ref(), spec)?;
        self.build_template(idx)?;
        for (name, expression) in &published {
            self.bind_parameter(owner, idx, name, expression)?;
        }
        Ok(idx)
    }

    /// Binds the element's parameters and returns those published by an embedded component
    /// of the element, which can only be bound once its template is built.
    fn bind_parameters(
        &mut self,
        owner: ElementIdx,
        idx: ElementIdx,
        declared: Option<&EmbeddedComponentModel>,
        spec: &ElementSpec,
    ) -> TapestryResult<Vec<(String, String)>> {
        let mut pairs: IndexMap<String, String> = declared
            .map(|d| d.parameters.clone())
            .unwrap_or_default();
        for (name, expression) in &spec.parameters {
            pairs.insert(name.clone(), expression.clone());
        }
        let mut published = Vec::new();
        for (name, expression) in pairs {
            if self.is_published(idx, &name) {
                published.push((name, expression));
            } else {
                self.bind_parameter(owner, idx, &name, &expression)?;
            }
        }

        if declared.is_some_and(|d| d.inherit_informal_parameters) {
            let core = self.element(idx).core.resources().clone();
            if core.model.supports_informal_parameters() {
                for (name, binding) in self.element(owner).core.resources().informal_bindings() {
                    if !core.is_bound(&name) {
                        core.bind(&name, binding);
                    }
                }
            }
        }
        Ok(published)
    }

    fn is_published(&self, idx: ElementIdx, name: &str) -> bool {
        let element = self.element(idx);
        let core = &element.core.resources().model;
        !name.contains('.')
            && core.parameter(name).is_none()
            && !element
                .mixins
                .iter()
                .any(|(_, m)| m.resources().model.parameter(name).is_some())
            && core.publisher_of(name).is_some()
    }

    /// Routes one binding: `mixin.param`, a core formal, a mixin formal, a published
    /// parameter of an embedded component, or an informal parameter.
    fn bind_parameter(
        &self,
        owner: ElementIdx,
        idx: ElementIdx,
        name: &str,
        expression: &str,
    ) -> TapestryResult<()> {
        let element = self.element(idx);
        let (target, parameter, model) = self.binding_target(element, name)?;
        let description = format!("parameter {name} of {}", element.complete_id);
        let binding = match expression.strip_prefix(INHERIT_PREFIX) {
            Some(inherited) => {
                match self.element(owner).core.resources().binding(inherited.trim()) {
                    Some(b) => b,
                    None => return Ok(()),
                }
            }
            None => {
                let prefix = model.as_ref().map_or("literal", |p| p.default_prefix.as_str());
                self.services.bindings().new_binding(
                    &description,
                    InstanceLocator::core(owner),
                    prefix,
                    expression,
                )?
            }
        };
        target.bind(&parameter, binding);
        Ok(())
    }

    fn binding_target(
        &self,
        element: &PageElement,
        name: &str,
    ) -> TapestryResult<(Arc<ComponentResources>, String, Option<ParameterModel>)> {
        if let Some((mixin, parameter)) = name.split_once('.') {
            let (_, instance) = element
                .mixins
                .iter()
                .find(|(id, _)| id.eq_ignore_ascii_case(mixin))
                .ok_or_else(|| {
                    TapestryError::binding(
                        &element.complete_id,
                        name,
                        format!("component has no mixin '{mixin}'"),
                    )
                })?;
            let resources = instance.resources().clone();
            let model = resources.model.parameter(parameter).cloned().ok_or_else(|| {
                TapestryError::binding(
                    &element.complete_id,
                    name,
                    format!("mixin {} has no formal parameter '{parameter}'", resources.class_name),
                )
            })?;
            return Ok((resources, parameter.to_string(), Some(model)));
        }

        let core = element.core.resources();
        if let Some(model) = core.model.parameter(name) {
            return Ok((core.clone(), name.to_string(), Some(model.clone())));
        }
        for (_, mixin) in &element.mixins {
            if let Some(model) = mixin.resources().model.parameter(name) {
                return Ok((mixin.resources().clone(), name.to_string(), Some(model.clone())));
            }
        }
        if let Some(publisher) = core.model.publisher_of(name) {
            let child = element
                .children
                .iter()
                .map(|c| self.element(*c))
                .find(|c| c.id.eq_ignore_ascii_case(&publisher.id))
                .ok_or_else(|| {
                    TapestryError::binding(
                        &element.complete_id,
                        name,
                        format!("publishing component '{}' was not created", publisher.id),
                    )
                })?;
            let resources = child.core.resources().clone();
            let model = resources.model.parameter(name).cloned();
            return Ok((resources, name.to_string(), model));
        }
        if core.model.supports_informal_parameters() {
            return Ok((core.clone(), name.to_string(), None));
        }
        if let Some((_, mixin)) = element
            .mixins
            .iter()
            .find(|(_, m)| m.resources().model.supports_informal_parameters())
        {
            return Ok((mixin.resources().clone(), name.to_string(), None));
        }
        Err(TapestryError::binding(
            &element.complete_id,
            name,
            format!(
                "component {} does not include a formal parameter '{name}' and does not support \
                 informal parameters",
                core.class_name
            ),
        ))
    }
}

/// Handlers naming a component id must refer to a component embedded in the element.
fn check_event_handlers(page: &Page) -> TapestryResult<()> {
    for (_, element) in page.elements() {
        let child_ids: Vec<String> = element
            .children
            .iter()
            .filter_map(|c| page.element(*c).ok())
            .map(|e| e.id.to_ascii_lowercase())
            .collect();
        for instance in element.instances() {
            let class = instance.class();
            for handler in class.all_handlers() {
                if handler.component_id.is_empty()
                    || child_ids.contains(&handler.component_id.to_ascii_lowercase())
                {
                    continue;
                }
                let method = class
                    .find_method(&handler.method)
                    .map(|m| m.describe())
                    .unwrap_or_else(|| handler.method.clone());
                return Err(TapestryError::event_handler(
                    method,
                    format!(
                        "component {} handles events from component id '{}', but it contains \
                         no component with that id",
                        instance.resources().complete_id,
                        handler.component_id
                    ),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/page/assembler.rs"]
mod tests;
