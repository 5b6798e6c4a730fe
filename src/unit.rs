//! Binding configuration and the component that owns live bindings.

use std::{fmt, rc::Rc, sync::Arc};

use crate::{
    accessor::AccessorRegistry,
    binding::{BindingMode, Endpoint, PropertyBinding, UpdateTrigger},
    config::BindingConfig,
    convert::ValueConverter,
    data_context::DataContext,
    error::BindingError,
    lifecycle::Lifecycle,
    object::ObjectRef,
    value::Value,
};

/// Everything needed to create one [`PropertyBinding`].
///
/// Mode, converter and parameter are fixed once the unit is built.
#[derive(Clone)]
pub struct BindingUnit {
    pub(crate) label: Option<String>,
    pub(crate) target: Endpoint,
    pub(crate) source: Endpoint,
    pub(crate) mode: BindingMode,
    pub(crate) converter: Option<Rc<dyn ValueConverter>>,
    pub(crate) parameter: Option<Value>,
    pub(crate) config: BindingConfig,
    pub(crate) registry: Option<Arc<AccessorRegistry>>,
}

impl BindingUnit {
    pub fn builder() -> BindingUnitBuilder {
        BindingUnitBuilder::default()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn target(&self) -> &Endpoint {
        &self.target
    }

    pub fn source(&self) -> &Endpoint {
        &self.source
    }

    pub fn mode(&self) -> BindingMode {
        self.mode
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Create the live binding.
    pub fn bind(&self) -> Result<PropertyBinding, BindingError> {
        PropertyBinding::new(self)
    }
}

impl fmt::Debug for BindingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingUnit")
            .field("label", &self.label)
            .field("target", &self.target)
            .field("source", &self.source)
            .field("mode", &self.mode)
            .field("converter", &self.converter.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[derive(Default)]
pub struct BindingUnitBuilder {
    label: Option<String>,
    target: Option<Endpoint>,
    source: Option<Endpoint>,
    target_trigger: Option<UpdateTrigger>,
    source_trigger: Option<UpdateTrigger>,
    mode: BindingMode,
    converter: Option<Rc<dyn ValueConverter>>,
    parameter: Option<Value>,
    config: BindingConfig,
    registry: Option<Arc<AccessorRegistry>>,
}

impl BindingUnitBuilder {
    /// Name used in diagnostics, typically the hierarchy path of the target.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn target(mut self, object: ObjectRef, path: impl Into<String>) -> Self {
        self.target = Some(Endpoint::object(object, path));
        self
    }

    pub fn target_context(mut self, context: Rc<DataContext>, path: impl Into<String>) -> Self {
        self.target = Some(Endpoint::context(context, path));
        self
    }

    pub fn target_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.target = Some(endpoint);
        self
    }

    pub fn target_trigger(mut self, trigger: UpdateTrigger) -> Self {
        self.target_trigger = Some(trigger);
        self
    }

    pub fn source(mut self, object: ObjectRef, path: impl Into<String>) -> Self {
        self.source = Some(Endpoint::object(object, path));
        self
    }

    pub fn source_context(mut self, context: Rc<DataContext>, path: impl Into<String>) -> Self {
        self.source = Some(Endpoint::context(context, path));
        self
    }

    pub fn source_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.source = Some(endpoint);
        self
    }

    pub fn source_trigger(mut self, trigger: UpdateTrigger) -> Self {
        self.source_trigger = Some(trigger);
        self
    }

    pub fn mode(mut self, mode: BindingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn converter(self, converter: impl ValueConverter + 'static) -> Self {
        self.shared_converter(Rc::new(converter))
    }

    pub fn shared_converter(mut self, converter: Rc<dyn ValueConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn parameter(mut self, parameter: impl Into<Value>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    pub fn config(mut self, config: BindingConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `registry` instead of [`AccessorRegistry::global`].
    pub fn registry(mut self, registry: Arc<AccessorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<BindingUnit, BindingError> {
        let mut target = self.target.ok_or(BindingError::MissingEndpoint("target"))?;
        let mut source = self.source.ok_or(BindingError::MissingEndpoint("source"))?;
        if let Some(trigger) = self.target_trigger {
            target.trigger = trigger;
        }
        if let Some(trigger) = self.source_trigger {
            source.trigger = trigger;
        }
        Ok(BindingUnit {
            label: self.label,
            target,
            source,
            mode: self.mode,
            converter: self.converter,
            parameter: self.parameter,
            config: self.config,
            registry: self.registry,
        })
    }
}

/// A component owning a set of bindings for its active lifetime.
///
/// Bindings are created in order on activation. If one fails, the ones
/// already created are released before the error is returned.
#[derive(Debug, Default)]
pub struct BindingComponent {
    units: Vec<BindingUnit>,
    active: Vec<PropertyBinding>,
}

impl BindingComponent {
    pub fn new(units: Vec<BindingUnit>) -> Self {
        Self {
            units,
            active: Vec::new(),
        }
    }

    pub fn push(&mut self, unit: BindingUnit) {
        self.units.push(unit);
    }

    pub fn units(&self) -> &[BindingUnit] {
        &self.units
    }

    /// Live bindings, empty unless active.
    pub fn bindings(&self) -> &[PropertyBinding] {
        &self.active
    }
}

impl Lifecycle for BindingComponent {
    type Error = BindingError;

    fn on_activate(&mut self) -> Result<(), BindingError> {
        for unit in &self.units {
            self.active.push(PropertyBinding::new(unit)?);
        }
        Ok(())
    }

    fn on_deactivate(&mut self) {
        for binding in self.active.drain(..) {
            binding.detach();
        }
    }
}
