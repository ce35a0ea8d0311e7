//! Request path resolution.
//!
//! Every request starts as descriptor state (index, type, id, name) and is
//! resolved into a [`PathInfo`] before anything is serialized. Each endpoint
//! family is a marker type implementing [`Endpoint`]; it owns the URL
//! template and the whitelist of query-string keys it recognizes.
//!
//! Missing mandatory segments fail with [`QuarryError::Dsl`] here, so a
//! partially formed path is never sent over the wire.

use crate::config::ConnectionSettings;
use crate::document::{Document, TypeNameMarker};
use crate::error::{QuarryError, Result};
use crate::query_string::QueryString;
use crate::resolver::TypeNameResolver;
use std::fmt;

/// HTTP method of a resolved request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// HEAD
    Head,
}

impl HttpMethod {
    /// Method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An endpoint family: URL template plus recognized query-string keys.
pub trait Endpoint:
    fmt::Debug + Clone + Copy + PartialEq + Eq + Default + Send + Sync + 'static
{
    /// Endpoint name, used in logs.
    const NAME: &'static str;

    /// Query-string keys this endpoint serializes.
    const PARAMS: &'static [&'static str];

    /// Render the request path from resolved segments.
    fn render(path: &PathInfo<Self>) -> Result<String>;
}

/// Resolved request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo<E: Endpoint> {
    /// Index segment.
    pub index: Option<String>,
    /// Type segment.
    pub type_name: Option<String>,
    /// Document id segment.
    pub id: Option<String>,
    /// Name segment (name-addressed endpoints).
    pub name: Option<String>,
    /// HTTP method.
    pub method: HttpMethod,
    /// Query-string options.
    pub query: QueryString<E>,
}

impl<E: Endpoint> PathInfo<E> {
    /// Empty path info for `method`.
    pub fn new(method: HttpMethod) -> Self {
        Self {
            index: None,
            type_name: None,
            id: None,
            name: None,
            method,
            query: QueryString::new(),
        }
    }

    /// Render the path.
    pub fn path(&self) -> Result<String> {
        E::render(self)
    }

    /// Serializable query-string pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query.pairs()
    }

    /// Non-empty index segment.
    pub fn index(&self) -> Option<&str> {
        present(&self.index)
    }

    /// Non-empty type segment.
    pub fn type_name(&self) -> Option<&str> {
        present(&self.type_name)
    }

    /// Non-empty id segment.
    pub fn id(&self) -> Option<&str> {
        present(&self.id)
    }

    /// Non-empty name segment.
    pub fn name(&self) -> Option<&str> {
        present(&self.name)
    }

    fn require_index(&self) -> Result<&str> {
        self.index().ok_or_else(|| QuarryError::missing("Index"))
    }

    fn require_type(&self) -> Result<&str> {
        self.type_name().ok_or_else(|| QuarryError::missing("Type"))
    }

    fn require_id(&self) -> Result<&str> {
        self.id().ok_or_else(|| QuarryError::missing("Id"))
    }

    fn require_name(&self) -> Result<&str> {
        self.name().ok_or_else(|| QuarryError::missing("Name"))
    }

    /// Re-target the query string at another endpoint family, keeping the segments.
    pub(crate) fn cast<F: Endpoint>(self) -> PathInfo<F> {
        PathInfo {
            index: self.index,
            type_name: self.type_name,
            id: self.id,
            name: self.name,
            method: self.method,
            query: QueryString::new(),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn seg(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

// ============================================================================
// Endpoint families
// ============================================================================

/// `POST /[{index}/[{type}/]]_bulk`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bulk;

impl Endpoint for Bulk {
    const NAME: &'static str = "bulk";
    const PARAMS: &'static [&'static str] = &["refresh", "consistency", "replication"];

    fn render(path: &PathInfo<Self>) -> Result<String> {
        match (path.index(), path.type_name()) {
            (Some(index), Some(ty)) => Ok(format!("/{}/{}/_bulk", seg(index), seg(ty))),
            (Some(index), None) => Ok(format!("/{}/_bulk", seg(index))),
            (None, None) => Ok("/_bulk".to_string()),
            (None, Some(_)) => Err(QuarryError::missing("Index")),
        }
    }
}

/// A single document inside a bulk batch: `/{index}/{type}[/{id}]`.
///
/// Never requested directly; the rendered path identifies the item in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkItem;

impl Endpoint for BulkItem {
    const NAME: &'static str = "bulk_item";
    const PARAMS: &'static [&'static str] = &[];

    fn render(path: &PathInfo<Self>) -> Result<String> {
        let base = format!("/{}/{}", seg(path.require_index()?), seg(path.require_type()?));
        Ok(match path.id() {
            Some(id) => format!("{}/{}", base, seg(id)),
            None => base,
        })
    }
}

/// `POST /{index}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreateIndex;

impl Endpoint for CreateIndex {
    const NAME: &'static str = "indices.create";
    const PARAMS: &'static [&'static str] = &[];

    fn render(path: &PathInfo<Self>) -> Result<String> {
        Ok(format!("/{}", seg(path.require_index()?)))
    }
}

/// `PUT /_percolator/{index}/{name}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterPercolator;

impl Endpoint for RegisterPercolator {
    const NAME: &'static str = "percolator.register";
    const PARAMS: &'static [&'static str] = &["refresh"];

    fn render(path: &PathInfo<Self>) -> Result<String> {
        let name = path.require_name()?;
        Ok(format!("/_percolator/{}/{}", seg(path.require_index()?), seg(name)))
    }
}

/// `DELETE /_percolator/{index}/{name}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnregisterPercolator;

impl Endpoint for UnregisterPercolator {
    const NAME: &'static str = "percolator.unregister";
    const PARAMS: &'static [&'static str] = &["refresh"];

    fn render(path: &PathInfo<Self>) -> Result<String> {
        let name = path.require_name()?;
        Ok(format!("/_percolator/{}/{}", seg(path.require_index()?), seg(name)))
    }
}

/// `GET /{index}/{type}/_percolate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Percolate;

impl Endpoint for Percolate {
    const NAME: &'static str = "percolate";
    const PARAMS: &'static [&'static str] = &["routing", "preference"];

    fn render(path: &PathInfo<Self>) -> Result<String> {
        Ok(format!(
            "/{}/{}/_percolate",
            seg(path.require_index()?),
            seg(path.require_type()?)
        ))
    }
}

/// `POST /{index}/{type}/{id}/_update`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Update;

impl Endpoint for Update {
    const NAME: &'static str = "update";
    const PARAMS: &'static [&'static str] = &[
        "refresh",
        "routing",
        "parent",
        "version",
        "version_type",
        "retry_on_conflict",
        "consistency",
        "replication",
        "percolate",
    ];

    fn render(path: &PathInfo<Self>) -> Result<String> {
        Ok(format!(
            "/{}/{}/{}/_update",
            seg(path.require_index()?),
            seg(path.require_type()?),
            seg(path.require_id()?)
        ))
    }
}

/// `GET /{index}/{type}/{id}/_source`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Source;

impl Endpoint for Source {
    const NAME: &'static str = "get_source";
    const PARAMS: &'static [&'static str] = &["routing", "preference", "realtime", "refresh"];

    fn render(path: &PathInfo<Self>) -> Result<String> {
        Ok(format!(
            "/{}/{}/{}/_source",
            seg(path.require_index()?),
            seg(path.require_type()?),
            seg(path.require_id()?)
        ))
    }
}

// ============================================================================
// Descriptor path state
// ============================================================================

/// Whether a document-addressed endpoint needs an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Id is mandatory.
    Required,
    /// Id may be omitted; the engine assigns one.
    Optional,
}

/// Path state of a name-addressed descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamePath {
    name: Option<String>,
}

impl NamePath {
    /// Set the `{name}` segment.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// The `{name}` segment, if set.
    pub fn name(&self) -> Option<&str> {
        present(&self.name)
    }

    /// Resolve into path info; fails with `missing Name()` when unset.
    pub fn to_path_info<E: Endpoint>(&self, method: HttpMethod) -> Result<PathInfo<E>> {
        let name = self.name().ok_or_else(|| QuarryError::missing("Name"))?;
        let mut info = PathInfo::new(method);
        info.name = Some(name.to_string());
        Ok(info)
    }
}

/// Path state of an index-addressed descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPath {
    index: Option<String>,
}

impl IndexPath {
    /// Set the `{index}` segment.
    pub fn set_index(&mut self, index: impl Into<String>) {
        self.index = Some(index.into());
    }

    /// The `{index}` segment, if set.
    pub fn index(&self) -> Option<&str> {
        present(&self.index)
    }

    /// Resolve into path info; fails with `missing Index()` when unset.
    pub fn to_path_info<E: Endpoint>(&self, method: HttpMethod) -> Result<PathInfo<E>> {
        let index = self.index().ok_or_else(|| QuarryError::missing("Index"))?;
        let mut info = PathInfo::new(method);
        info.index = Some(index.to_string());
        Ok(info)
    }
}

/// Path state of a document-addressed descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath {
    marker: TypeNameMarker,
    index: Option<String>,
    type_name: Option<String>,
    id: Option<String>,
}

impl DocumentPath {
    /// Path state for documents identified by `marker`.
    pub fn new(marker: TypeNameMarker) -> Self {
        Self {
            marker,
            index: None,
            type_name: None,
            id: None,
        }
    }

    /// Path state for documents of type `T`.
    pub fn for_type<T: Document>() -> Self {
        Self::new(TypeNameMarker::of::<T>())
    }

    /// Override the index.
    pub fn set_index(&mut self, index: impl Into<String>) {
        self.index = Some(index.into());
    }

    /// Override the type name.
    pub fn set_type(&mut self, type_name: impl Into<String>) {
        self.type_name = Some(type_name.into());
    }

    /// Set the document id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Set the document id unless one is already set.
    pub fn default_id(&mut self, id: Option<String>) {
        if present(&self.id).is_none() {
            self.id = id;
        }
    }

    /// The document id, if set.
    pub fn id(&self) -> Option<&str> {
        present(&self.id)
    }

    /// The type marker.
    pub fn marker(&self) -> &TypeNameMarker {
        &self.marker
    }

    /// Resolve into path info. Explicit segments win; missing ones come from
    /// the type name resolver. The id requirement is checked first.
    pub fn to_path_info<E: Endpoint>(
        &self,
        settings: &ConnectionSettings,
        method: HttpMethod,
        id_policy: IdPolicy,
    ) -> Result<PathInfo<E>> {
        let id = self.id().map(str::to_string);
        if id_policy == IdPolicy::Required && id.is_none() {
            return Err(QuarryError::missing("Id"));
        }

        let resolver = TypeNameResolver::new(settings);
        let index = match present(&self.index) {
            Some(index) => index.to_string(),
            None => resolver.index(&self.marker)?,
        };
        let type_name = match present(&self.type_name) {
            Some(ty) => ty.to_string(),
            None => resolver.type_name(&self.marker)?,
        };

        let mut info = PathInfo::new(method);
        info.index = Some(index);
        info.type_name = Some(type_name);
        info.id = id;
        Ok(info)
    }
}
