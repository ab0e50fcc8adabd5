//! The fixed list of backend models and the current selection.

pub const DEFAULT_MODEL: &str = "mistral-large";

/// `(identifier, display name)` pairs offered by the model picker.
pub const KNOWN_MODELS: &[(&str, &str)] = &[
    ("mistral-large", "Mistral Large"),
    ("reka-flash", "Reka Flash"),
    ("llama2-70b-chat", "Llama2-70B Chat"),
    ("gemma-7b", "Gemma 7B"),
    ("mixtral-8x7b", "Mixtral 8x7B"),
    ("mistral-7b", "Mistral 7B"),
];

/// Holds the model identifier sent with every query.
///
/// Identifiers outside [`KNOWN_MODELS`] are kept as-is; the backend decides
/// whether it supports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    current: String,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl ModelSelector {
    pub fn new(model: &str) -> Self {
        let model = model.trim();
        Self {
            current: if model.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                model.to_string()
            },
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn select(&mut self, model: &str) {
        self.current = model.to_string();
    }

    /// Position of the current model in [`KNOWN_MODELS`], if it is listed.
    pub fn index(&self) -> Option<usize> {
        KNOWN_MODELS.iter().position(|(id, _)| *id == self.current)
    }

    pub fn display_name(&self) -> &str {
        display_name(&self.current)
    }
}

/// Human-readable name, falling back to the raw identifier.
pub fn display_name(model: &str) -> &str {
    KNOWN_MODELS
        .iter()
        .find(|(id, _)| *id == model)
        .map(|(_, name)| *name)
        .unwrap_or(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_and_blank() {
        assert_eq!(ModelSelector::default().current(), "mistral-large");
        assert_eq!(ModelSelector::new("  ").current(), "mistral-large");
    }

    #[test]
    fn test_unknown_model_is_kept() {
        let selector = ModelSelector::new("my-finetune");
        assert_eq!(selector.current(), "my-finetune");
        assert_eq!(selector.index(), None);
        assert_eq!(selector.display_name(), "my-finetune");
    }

    #[test]
    fn test_select_known_model() {
        let mut selector = ModelSelector::new("mistral-large");
        selector.select("mistral-7b");
        assert_eq!(selector.current(), "mistral-7b");
        assert_eq!(selector.index(), Some(5));
        assert_eq!(selector.display_name(), "Mistral 7B");
    }
}
