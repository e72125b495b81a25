//! shipforms - revisioned record keeping for ship inspection, equipment,
//! QHSE, procurement and crew forms
//!
//! Every record carries a `"major.minor"` revision label: creation assigns
//! the next whole-number major, edits bump the minor.

pub mod cli;
pub mod forms;
pub mod http_server;
pub mod observability;
pub mod revision;
pub mod storage;
pub mod uploads;
