//! Copying records between endpoints.

use crate::endpoint::{Endpoint, EndpointOptions, Role};
use crate::error::EndpointResult;
use tracing::info;

/// Outcome of a copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Documents written to the destination.
    pub copied: usize,
}

/// Copies up to `limit` documents from `source` to `destination`.
///
/// The source is read in full before the destination is prepared, so a
/// destination that aliases the source (the same JSON file, say) is only
/// truncated after its records are in memory. A missing source is reported
/// before the destination is touched.
pub fn copy(
    source: &mut Endpoint,
    destination: &mut Endpoint,
    options: &EndpointOptions,
    limit: Option<usize>,
) -> EndpointResult<CopyStats> {
    source.prepare(Role::Source, options)?;
    let records = source.read(limit)?;

    destination.prepare(Role::Destination, options)?;
    let copied = destination.write(&records)?;
    destination.finish()?;

    info!(copied, %source, %destination, "copy finished");
    Ok(CopyStats { copied })
}
