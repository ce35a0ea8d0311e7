//! Point read of a document's source.

use crate::config::ConnectionSettings;
use crate::document::{Document, TypeNameMarker};
use crate::error::Result;
use crate::path::{DocumentPath, HttpMethod, IdPolicy, PathInfo, Source};
use crate::transport::TransportRequest;
use std::marker::PhantomData;
use std::sync::Arc;

/// Descriptor for `GET /{index}/{type}/{id}/_source`.
#[derive(Debug, Clone)]
pub struct SourceDescriptor<T: Document> {
    settings: Arc<ConnectionSettings>,
    path: DocumentPath,
    routing: Option<String>,
    preference: Option<String>,
    realtime: Option<bool>,
    refresh: Option<bool>,
    _document: PhantomData<fn() -> T>,
}

impl<T: Document> SourceDescriptor<T> {
    /// Read a document of type `T`.
    pub fn new(settings: Arc<ConnectionSettings>) -> Self {
        Self::with_path(settings, DocumentPath::for_type::<T>())
    }

    /// Read a document addressed by an explicit type name.
    pub fn with_marker(settings: Arc<ConnectionSettings>, marker: TypeNameMarker) -> Self {
        Self::with_path(settings, DocumentPath::new(marker))
    }

    fn with_path(settings: Arc<ConnectionSettings>, path: DocumentPath) -> Self {
        Self {
            settings,
            path,
            routing: None,
            preference: None,
            realtime: None,
            refresh: None,
            _document: PhantomData,
        }
    }

    /// Document id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.path.set_id(id);
        self
    }

    /// Index, overriding type name resolution.
    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.path.set_index(index);
        self
    }

    /// Type name, overriding type name resolution.
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.path.set_type(type_name);
        self
    }

    /// Routing key.
    pub fn routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }

    /// Shard preference.
    pub fn preference(mut self, preference: impl Into<String>) -> Self {
        self.preference = Some(preference.into());
        self
    }

    /// Read from the transaction log rather than the last refreshed state.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = Some(realtime);
        self
    }

    /// Refresh the shard before reading.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Resolve the target path.
    pub fn path_info(&self) -> Result<PathInfo<Source>> {
        let mut info =
            self.path
                .to_path_info::<Source>(&self.settings, HttpMethod::Get, IdPolicy::Required)?;
        info.query.set_opt("routing", self.routing.as_deref());
        info.query.set_opt("preference", self.preference.as_deref());
        info.query.set_opt("realtime", self.realtime);
        info.query.set_opt("refresh", self.refresh);
        Ok(info)
    }

    /// Resolve into a request.
    pub fn to_request(&self) -> Result<TransportRequest> {
        let info = self.path_info()?;
        Ok(TransportRequest::new(info.method, info.path()?).with_query(info.query_pairs()))
    }
}
