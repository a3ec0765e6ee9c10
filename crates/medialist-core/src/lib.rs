//! Medialist Core Library
//!
//! This crate provides the core functionality for medialist, a store of
//! user-owned lists of movies, TV series and anime.
//!
//! # Architecture
//!
//! - **Entity stores**: one catalog per media kind, keyed by catalog id
//! - **List store**: list metadata with an owner index
//! - **Membership stores**: list/entity associations, one per media kind
//!
//! Each store has three interchangeable backends (memory, flat file,
//! SQLite). `Store` picks one set when it is opened.
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::open()?;
//!
//! store.create_list(&ListRecord::new(1, "Favorites", "alice"))?;
//! store.add_to_list(1, &Movie::new(42, "Film A", 120))?;
//!
//! let movies: Vec<Movie> = store.list_members(1)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `models`: Lists, media kinds and entity records
//! - `storage`: Store contracts and the three backends
//! - `config`: Application configuration

pub mod config;
pub mod models;
pub mod storage;
pub mod store;

pub use config::{Backend, Config};
pub use models::{Anime, ListContents, ListRecord, MediaEntity, MediaKind, Movie, TvSeries};
pub use storage::{StoreError, StoreResult};
pub use store::{HasMediaStores, MediaStores, Store};
