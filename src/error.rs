use thiserror::Error;

/// A binding path could not be resolved against a type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve `{segment}` (segment {index} of `{path}`) on `{type_name}`: {reason}")]
pub struct PathResolutionError {
    pub path: String,
    pub segment: String,
    pub index: usize,
    pub type_name: String,
    pub reason: UnresolvedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnresolvedReason {
    #[error("no such property")]
    NoSuchProperty,
    #[error("the previous segment is not an object type")]
    NotAnObject,
    #[error("empty segment")]
    EmptySegment,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("cannot convert a value of type `{from}` to `{to}`")]
    TypeMismatch { from: String, to: String },
    #[error("the converter does not support this direction")]
    Unsupported,
    #[error("conversion failed: {0}")]
    Failed(String),
}

impl ConversionError {
    pub fn mismatch(from: impl Into<String>, to: impl Into<String>) -> Self {
        ConversionError::TypeMismatch {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("the accessor registry is sealed")]
    Sealed,
    #[error(transparent)]
    InvalidPath(#[from] PathResolutionError),
    #[error("the identity path has no accessors")]
    IdentityPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("binding `{binding}`: {source}")]
    Conversion {
        binding: String,
        #[source]
        source: ConversionError,
    },
    #[error("binding `{binding}`: {source}")]
    Path {
        binding: String,
        #[source]
        source: PathResolutionError,
    },
    #[error("binding is missing its {0} endpoint")]
    MissingEndpoint(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataContextError {
    #[error("data of type `{found}` is not assignable to `{expected}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError<E> {
    #[error("component is already active")]
    AlreadyActive,
    #[error("component has been disposed")]
    Disposed,
    #[error("activation failed: {0}")]
    Activation(E),
}
