//! Type name resolution.

use crate::config::ConnectionSettings;
use crate::document::TypeNameMarker;
use crate::error::{QuarryError, Result};

/// Maps a [`TypeNameMarker`] to the index and type name used on the wire.
///
/// Index resolution order: override registered on the settings, index
/// declared by the document type, settings default index. Type names come
/// from an override, or from the type tag by convention (lowercased and,
/// when enabled, pluralized). Explicit [`TypeNameMarker::Name`]s are used
/// verbatim.
#[derive(Debug, Clone, Copy)]
pub struct TypeNameResolver<'a> {
    settings: &'a ConnectionSettings,
}

impl<'a> TypeNameResolver<'a> {
    /// Create a resolver over `settings`.
    pub fn new(settings: &'a ConnectionSettings) -> Self {
        Self { settings }
    }

    /// Resolve the `(index, type_name)` pair for `marker`.
    pub fn resolve(&self, marker: &TypeNameMarker) -> Result<(String, String)> {
        Ok((self.index(marker)?, self.type_name(marker)?))
    }

    /// Resolve the type name for `marker`.
    pub fn type_name(&self, marker: &TypeNameMarker) -> Result<String> {
        let name = match marker {
            TypeNameMarker::Name(name) => name.clone(),
            TypeNameMarker::Type(doc_type) => self
                .settings
                .type_mapping(doc_type.tag)
                .and_then(|m| m.type_name.clone())
                .unwrap_or_else(|| infer_type_name(doc_type.tag, self.settings.pluralize_type_names)),
        };

        if name.is_empty() {
            return Err(QuarryError::Configuration(format!(
                "type name for {} resolved to an empty string",
                marker
            )));
        }

        Ok(name)
    }

    /// Resolve the index for `marker`.
    pub fn index(&self, marker: &TypeNameMarker) -> Result<String> {
        let registered = self
            .settings
            .type_mapping(marker.key())
            .and_then(|m| m.index.clone());

        let declared = match marker {
            TypeNameMarker::Type(doc_type) => doc_type.index.map(str::to_string),
            TypeNameMarker::Name(_) => None,
        };

        registered
            .or(declared)
            .or_else(|| self.settings.default_index.clone())
            .filter(|index| !index.is_empty())
            .ok_or_else(|| {
                QuarryError::Configuration(format!(
                    "no index could be determined for {}: register one or set a default index",
                    marker
                ))
            })
    }

    /// Resolve the index from the settings default alone.
    pub fn default_index(&self) -> Result<String> {
        self.settings
            .default_index
            .clone()
            .filter(|index| !index.is_empty())
            .ok_or_else(|| QuarryError::Configuration("no default index configured".to_string()))
    }
}

/// Infer a type name from a type tag.
pub fn infer_type_name(tag: &str, pluralize: bool) -> String {
    let lower = tag.to_lowercase();
    if pluralize { pluralize_word(&lower) } else { lower }
}

fn pluralize_word(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let consonant_y = word.ends_with('y')
        && !word
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));

    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| word.ends_with(s)) {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}
