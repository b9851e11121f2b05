//! # Aasmap Architecture
//!
//! Aasmap imports Asset Administration Shell objects from spreadsheet rows.
//! A user takes an existing object, turns it into a **template**, points some
//! of its fields at spreadsheet columns with **import markers** (`$A$`,
//! `urn:motor:$B$`), and replays the template against every row.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (args.rs, wired by main.rs)                      │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Picks the sheet and the row range from the config        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Import, preview, mapping read/write                      │
//! │  - Returns CmdResult, never prints                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Template Layer (preobject.rs, import/)                     │
//! │  - PreObject: a deferred constructor call                   │
//! │  - PreObjectImport: a PreObject whose markers resolve       │
//! │    against a workbook row                                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Model Layer (types.rs, value.rs, model.rs, registry.rs)    │
//! │  - Static class descriptions and their constructors         │
//! │  - ClassesInfo: per-class presentation and editing facts    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Templates Never Change While Importing
//!
//! Realizing a template builds a fresh value each time and leaves the
//! template untouched. Only [`import::PreObjectImport::set_mapping`] edits a
//! template, and it does so in place.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Import, preview and mapping commands
//! - [`import`]: Templates, mappings, marker resolution and workbooks
//! - [`preobject`]: Deferred object construction
//! - [`registry`]: The ClassesInfo registry
//! - [`model`]: The AAS classes and enums
//! - [`types`] and [`value`]: Runtime type descriptions and values
//! - [`codec`]: JSON documents for values
//! - [`config`]: Import settings
//! - [`error`]: Error types

pub mod api;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod import;
pub mod model;
pub mod preobject;
pub mod registry;
pub mod types;
pub mod value;
