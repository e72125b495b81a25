//! # Revision Sequencer
//!
//! Every form record carries a `"major.minor"` revision label.
//!
//! - A new record gets the next whole-number major: `"{count + 1}.0"`
//! - An edit bumps only the minor component: `"2.3"` -> `"2.4"`
//!
//! The sequencer is pure: it never queries storage and never fails. The
//! caller supplies the persisted record count (create) or the stored label
//! (update) and writes the returned label back onto the document.

mod label;
mod sequencer;

pub use label::{RevisionLabel, RevisionParseError};
pub use sequencer::{next_label_for_create, next_label_for_update, next_label_for_update_value};
