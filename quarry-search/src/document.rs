//! Document trait and type identity.

use serde::{Serialize, de::DeserializeOwned};

/// Trait for documents that can be stored in the engine.
///
/// The `type_tag` is the stable identity of the Rust type. Index and type
/// names are derived from it by the [`TypeNameResolver`](crate::TypeNameResolver),
/// either through overrides registered on the
/// [`ConnectionSettings`](crate::ConnectionSettings) or by convention.
///
/// # Example
///
/// ```rust
/// use quarry_search::Document;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Project {
///     id: u32,
///     name: Option<String>,
/// }
///
/// impl Document for Project {
///     fn type_tag() -> &'static str {
///         "Project"
///     }
///
///     fn id(&self) -> Option<String> {
///         Some(self.id.to_string())
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Stable tag identifying this document type.
    fn type_tag() -> &'static str;

    /// Index this type lives in, when it is not registered on the settings.
    fn index_name() -> Option<&'static str> {
        None
    }

    /// Identity of this document, if it carries one.
    fn id(&self) -> Option<String> {
        None
    }

    /// Routing key for this document.
    fn routing(&self) -> Option<String> {
        None
    }
}

/// Identifies a document type, either by an explicit type name or by the
/// tag of a [`Document`] type.
///
/// Markers compare by value and can be used as map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeNameMarker {
    /// An explicit type name, used verbatim.
    Name(String),
    /// A document type, resolved through overrides or naming convention.
    Type(DocumentType),
}

/// Static identity of a [`Document`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentType {
    /// Type tag.
    pub tag: &'static str,
    /// Index declared by the type itself.
    pub index: Option<&'static str>,
}

impl TypeNameMarker {
    /// Marker for an explicit type name.
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Marker for the document type `T`.
    pub fn of<T: Document>() -> Self {
        Self::Type(DocumentType {
            tag: T::type_tag(),
            index: T::index_name(),
        })
    }

    /// The key used to look up overrides on the settings.
    pub fn key(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Type(doc_type) => doc_type.tag,
        }
    }
}

impl From<&str> for TypeNameMarker {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for TypeNameMarker {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl std::fmt::Display for TypeNameMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{}", name),
            Self::Type(doc_type) => write!(f, "<{}>", doc_type.tag),
        }
    }
}
