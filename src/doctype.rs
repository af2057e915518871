//! Document-type registry with change notification.
//!
//! The registry knows every document type the site can contain. Five types
//! are built in ([`BUILTIN_TYPES`]); render engines and site configuration add
//! more at runtime. Each call to [`DocumentTypeRegistry::register`] notifies
//! every [`TypeListener`] synchronously, in registration order, before it
//! returns. Listeners are how dependent registries (the extractor bindings in
//! [`crate::extract`]) learn about new types before any document of that type
//! reaches the render stage.
//!
//! # Notification contract
//!
//! Set membership is idempotent; notification is not. Registering a type that
//! is already known leaves the set unchanged and still fires every listener
//! once. Listeners must therefore tolerate repeated calls for the same name.
//!
//! The registry is an ordinary value: construct one per process (or per test)
//! and pass it to whoever needs it.

use thiserror::Error;

/// Types known before anything is registered, in declaration order.
pub const BUILTIN_TYPES: [&str; 5] = ["page", "post", "index", "archive", "feed"];

/// Raised by a listener callback.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ListenerError(pub String);

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid document type name: {0:?}")]
    InvalidName(String),
    #[error("Listener '{listener}' failed for type '{type_name}': {source}")]
    Listener {
        listener: String,
        type_name: String,
        #[source]
        source: ListenerError,
    },
}

/// Subscriber to type registrations.
pub trait TypeListener {
    /// Name used in error messages and logs.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Called once per `register` call, including repeats of known types.
    fn on_added(&mut self, type_name: &str) -> Result<(), ListenerError>;
}

impl<F> TypeListener for F
where
    F: FnMut(&str) -> Result<(), ListenerError>,
{
    fn on_added(&mut self, type_name: &str) -> Result<(), ListenerError> {
        self(type_name)
    }
}

/// A render-engine plugin and the document types it brings.
pub trait EngineProvider {
    fn name(&self) -> &str;

    fn document_types(&self) -> Vec<String>;
}

/// Engine provider backed by a fixed list, e.g. types declared in config.
#[derive(Debug, Clone)]
pub struct DeclaredTypes {
    name: String,
    types: Vec<String>,
}

impl DeclaredTypes {
    pub fn new(name: impl Into<String>, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            types: types.into_iter().map(Into::into).collect(),
        }
    }
}

impl EngineProvider for DeclaredTypes {
    fn name(&self) -> &str {
        &self.name
    }

    fn document_types(&self) -> Vec<String> {
        self.types.clone()
    }
}

pub struct DocumentTypeRegistry {
    /// Custom types in registration order. Built-ins live in `BUILTIN_TYPES`.
    custom: Vec<String>,
    listeners: Vec<Box<dyn TypeListener>>,
    engines_loaded: bool,
}

impl Default for DocumentTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTypeRegistry {
    pub fn new() -> Self {
        Self {
            custom: Vec::new(),
            listeners: Vec::new(),
            engines_loaded: false,
        }
    }

    /// Append a listener. Listeners are never removed.
    pub fn add_listener(&mut self, listener: impl TypeListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Add `type_name` if absent, then notify every listener in order.
    ///
    /// Returns whether the name was new. The first listener error aborts the
    /// notification loop and is returned as is; the type stays registered.
    pub fn register(&mut self, type_name: &str) -> Result<bool, RegistryError> {
        validate_name(type_name)?;
        let added = !self.contains(type_name);
        if added {
            self.custom.push(type_name.to_string());
            tracing::debug!(type_name, "registered document type");
        }
        for listener in &mut self.listeners {
            listener
                .on_added(type_name)
                .map_err(|source| RegistryError::Listener {
                    listener: listener.name().to_string(),
                    type_name: type_name.to_string(),
                    source,
                })?;
        }
        Ok(added)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        BUILTIN_TYPES.contains(&type_name) || self.custom.iter().any(|t| t == type_name)
    }

    /// Built-ins in declaration order, then custom types in registration order.
    pub fn all_types(&self) -> Vec<&str> {
        BUILTIN_TYPES
            .iter()
            .copied()
            .chain(self.custom.iter().map(String::as_str))
            .collect()
    }

    pub fn custom_types(&self) -> &[String] {
        &self.custom
    }

    /// Register the types of every engine plugin, once per registry.
    ///
    /// Called explicitly by the orchestrator at startup rather than hidden
    /// inside a query. Later calls are no-ops.
    pub fn ensure_engines_loaded(
        &mut self,
        engines: &[&dyn EngineProvider],
    ) -> Result<(), RegistryError> {
        if self.engines_loaded {
            return Ok(());
        }
        for engine in engines {
            for type_name in engine.document_types() {
                self.register(&type_name)?;
            }
            tracing::debug!(engine = engine.name(), "loaded render engine");
        }
        self.engines_loaded = true;
        Ok(())
    }

    pub fn engines_loaded(&self) -> bool {
        self.engines_loaded
    }
}

fn validate_name(type_name: &str) -> Result<(), RegistryError> {
    if type_name.trim().is_empty() || type_name.contains('/') || type_name != type_name.trim() {
        return Err(RegistryError::InvalidName(type_name.to_string()));
    }
    Ok(())
}
