//! The Durable Store: a SQLite-backed, transactional home for accounts,
//! jobs, job events, previews, and the local media/album index.

pub mod accounts;
pub mod index;
pub mod jobs;
pub mod pool;
pub mod previews;

pub use accounts::AccountRepo;
pub use index::{AlbumIndexRepo, MediaIndexRepo, MediaPage};
pub use jobs::JobRepo;
pub use pool::{create_pool, DbConfig, DbError};
pub use previews::PreviewRepo;
