pub mod batch;
pub mod pool;
pub mod recompute;

pub use batch::batch_ranges;
pub use pool::WorkerPool;
pub use recompute::{
    BoundsUpdate, CancelToken, EntityKind, RecomputeFailure, RecomputeJob, RecomputeReport,
};
