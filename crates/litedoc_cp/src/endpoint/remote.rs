//! Remote replication endpoint.
//!
//! `ws:` and `wss:` locators are recognized so they get a clear error
//! instead of a misleading hint, but no replicator is available here.

use super::{DocRecord, EndpointOptions, Role};
use crate::error::{EndpointError, EndpointResult};
use url::Url;

/// A replication URL.
#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    url: String,
}

impl RemoteEndpoint {
    pub(crate) fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }

    /// The URL as given.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn prepare(&mut self, _role: Role, _options: &EndpointOptions) -> EndpointResult<()> {
        Url::parse(&self.url).map_err(|source| EndpointError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;
        Err(self.unavailable())
    }

    pub(crate) fn read(&mut self, _limit: Option<usize>) -> EndpointResult<Vec<DocRecord>> {
        Err(self.unavailable())
    }

    pub(crate) fn write(&mut self, _records: &[DocRecord]) -> EndpointResult<usize> {
        Err(self.unavailable())
    }

    fn unavailable(&self) -> EndpointError {
        EndpointError::ReplicationUnavailable {
            url: self.url.clone(),
        }
    }
}
