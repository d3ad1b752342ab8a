//! `friendbook` - a local contact book.
//!
//! Records (name, phone, social handle, note, optional photo and the position
//! where they were created) live in a single JSON file that is rewritten
//! atomically on every change. A [`LocationFeed`] keeps the most recent fix
//! from a [`location::LocationProvider`] so a new record can be stamped with
//! it through an [`AddFlow`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod location;
pub mod logging;
pub mod record;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use flow::{AddFlow, RecordDraft};
pub use location::{Coordinate, LocationFeed};
pub use logging::init_logging;
pub use record::{Portrait, Record};
pub use store::{RecordStore, StoreStats, WritePolicy};
