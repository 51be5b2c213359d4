//! The job-lifecycle core: the action resolver, the preview two-phase
//! commit registry, the worker pool, and the job executor that dispatches
//! to `photoflow_adapters`. Everything here is store-backed; callers
//! (the HTTP layer, the binary) own process wiring only.

pub mod cancel;
pub mod error;
pub mod executor;
pub mod pool;
pub mod preview;
pub mod resolver;

pub use cancel::CancellationToken;
pub use error::CoreError;
pub use executor::JobExecutor;
pub use pool::{CancelRegistry, PoolConfig, WorkerPool};
pub use preview::{PreviewRegistry, DEFAULT_TTL_MINUTES};
pub use resolver::{ActionResolver, ResolvedTargets};
