pub mod pool;

pub use pool::{PoolRecord, RawPool, YieldSnapshot};
