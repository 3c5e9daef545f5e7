//! Core library for the ODF Browser.
//! Loads a categorized dataset of game object definition files, searches it,
//! clusters each record's property groups into tabs, and lays the resulting
//! cards out in two balanced columns.

pub mod config;
pub mod dataset;
pub mod error;
pub mod fuzzy;
pub mod grouping;
mod gui;
pub mod layout;
pub mod nav;
pub mod search;
pub mod statics;
mod value;

pub use config::{BrowserConfig, DeepLink};
pub use dataset::{Dataset, DatasetFormat, LoadedDataset, PropertyGroup, Record};
pub use error::{DatasetError, LookupError};
pub use fuzzy::fuzzy;
pub use grouping::{PropertyGroups, PropertyTab, filter_rows, group_record};
pub use gui::{Startup, run_gui};
pub use layout::{Columns, balance_columns, balance_rows};
pub use nav::{Browser, Direction, InterruptAction};
pub use search::{ItemRef, SearchIndex, SearchOutcome};
pub use value::{OdfNumber, OdfValue, PropertyDisplay, classify, classify_value};
