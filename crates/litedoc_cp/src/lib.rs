//! # LiteDoc Copy
//!
//! Copies documents between LiteDoc databases, newline-delimited JSON files
//! and directories of JSON files.
//!
//! The [`Endpoint`] factory turns a path or URL into the right adapter;
//! [`copy`] moves records from a source endpoint to a destination.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod copy;
pub mod endpoint;
mod error;

pub use copy::{copy, CopyStats};
pub use endpoint::{DocRecord, Endpoint, EndpointKind, EndpointOptions, Role};
pub use error::{EndpointError, EndpointResult, Hint, UnrecognizedLocator};
