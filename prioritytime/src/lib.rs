//! Priority tree engine.
//!
//! Leisures form a forest of arbitrary depth. Each row stores its chain of
//! ancestor ids as a canonical string ([`AncestryPath`]), so sibling lookups
//! are an indexed equality scan and subtree removal is one prefix-range
//! delete. Counters roll up: incrementing a leisure increments every
//! ancestor in the same transaction.
//!
//! [`Store`] is the composition point; it wires [`LeisureDao`] into
//! [`LocalLeisureRepository`] and hands that to each use case.

pub mod ancestry;
pub mod config;
pub mod db;
pub mod error;
pub mod migration;
pub mod model;
pub mod repository;
pub mod store;
pub mod tree;
pub mod usecase;

pub use ancestry::AncestryPath;
pub use config::Config;
pub use db::{LeisureDao, LeisureSubscription};
pub use error::{PriorityError, Result};
pub use model::{Leisure, LeisureEntity, NewLeisure};
pub use repository::{LeisureRepository, LocalLeisureRepository};
pub use store::Store;
pub use tree::TreeNode;
