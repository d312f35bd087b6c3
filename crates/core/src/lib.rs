pub mod codec;
pub mod error;
pub mod merge;
pub mod title;
pub mod types;
pub mod user;

pub use codec::{EmbeddedDoc, ListDoc};
pub use error::DocumentError;
pub use types::{Keyed, Reconcile, TableKind, UserListKind};
