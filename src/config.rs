use crate::convert::Culture;

/// Per-binding options that do not change how values flow.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BindingConfig {
    /// Passed to converters.
    pub culture: Culture,
    /// Refuse to create a binding whose paths do not resolve instead of
    /// creating an inert one.
    pub strict_paths: bool,
    /// Copy a value once when the binding is created.
    pub initial_sync: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            culture: Culture::invariant(),
            strict_paths: false,
            initial_sync: true,
        }
    }
}

impl BindingConfig {
    pub fn with_culture(mut self, culture: Culture) -> Self {
        self.culture = culture;
        self
    }

    pub fn strict(mut self) -> Self {
        self.strict_paths = true;
        self
    }

    pub fn without_initial_sync(mut self) -> Self {
        self.initial_sync = false;
        self
    }
}
