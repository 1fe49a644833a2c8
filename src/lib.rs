//! venuedex - filter, search and bookmark a ranked catalog of academic venues.
//!
//! The catalog is a JSON document of fields of study, each holding journals
//! and conferences grouped under rank labels. A [`FilterState`] narrows it
//! down by rank, field, type and a case-insensitive query, and a
//! [`SelectionSet`] keeps bookmarked venues across runs in `config.redb`.
//!
//! # Quick start
//!
//! ```no_run
//! use venuedex::{ConfigDb, DataDir, FilterState, Session};
//! use venuedex::render;
//!
//! let data_dir = DataDir::resolve(None).unwrap();
//! let config_db = ConfigDb::open(&data_dir.config_db()).unwrap();
//! let catalog = data_dir.catalog_path(None, &config_db).unwrap();
//!
//! let session = Session::open(&catalog, &config_db);
//! let view = session.view(&FilterState::new().with_query("graphics"));
//! for r in &view.results {
//!     println!(
//!         "{} [{} {}] {}",
//!         r.entry.abbreviation, r.category, r.rank, r.field
//!     );
//! }
//! print!("{}", render::format_human(&view));
//! ```

pub mod catalog;
pub mod cli;
pub mod config_db;
pub mod data_dir;
pub mod error;
pub mod filter;
pub mod identity;
pub mod mcp;
pub mod render;
pub mod search;
pub mod selection;
pub mod session;
pub mod store;
pub mod text_util;

pub use catalog::{Catalog, Category, CatalogEntry};
pub use config_db::ConfigDb;
pub use data_dir::DataDir;
pub use error::{Error, Result};
pub use filter::FilterState;
pub use identity::ItemIdentity;
pub use search::View;
pub use selection::SelectionSet;
pub use session::Session;
pub use store::KeyValueStore;
