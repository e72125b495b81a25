//! # Forms
//!
//! The twenty record types of the application share one lifecycle: create
//! with a fresh major revision, edit with a minor bump, optional file
//! attachment, opaque JSON body. This module holds the registry of types
//! and the service that applies that lifecycle.

pub mod errors;
pub mod kind;
pub mod merge;
pub mod service;

pub use errors::{FormError, FormResult};
pub use kind::{FormKind, FormKindInfo, RevisionField};
pub use merge::apply_partial_update;
pub use service::FormService;
