//! Indexes configured directories into a catalog of commands and mentions.
//!
//! Each [`SearchEntry`] names a root directory, a glob pattern (optionally
//! followed by a nested JSON query such as `config.json@.members`) and the
//! templates that turn every matched file or record into a [`SearchItem`].
//! The [`Loader`] scans all entries, deduplicates per entry, and caches the
//! result for a short time.
//!
//! ```rust,ignore
//! use runner_index::{ItemType, Loader, Settings};
//!
//! let mut loader = Loader::new(None, Settings::default());
//! for item in loader.search_items(ItemType::Mention, "agent:rev") {
//!     println!("{} - {}", item.name, item.description);
//! }
//! ```

pub mod assembler;
pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod model;
pub mod order;
pub mod parser;
pub mod pattern;
pub mod query;
pub mod sources;
pub mod template;

pub use cache::{Clock, SystemClock};
pub use config::{Config, NameFilter, SearchEntry, Settings};
pub use loader::Loader;
pub use model::{DisplayTime, ItemType, SearchItem};
pub use query::{JsonQuery, PathQuery};
pub use template::{PlaceholderResolver, TemplateContext, TemplateResolver};
