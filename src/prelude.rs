pub use crate::builder::{Cache, CacheBuilder, PolicyKind};
pub use crate::error::ConfigError;
pub use crate::metrics::{StrategyPerformance, TinyLfuStats};
pub use crate::policy::adaptive::{AdaptiveCache, Strategy};
pub use crate::policy::arc::ArcCache;
pub use crate::policy::lfu::LfuCache;
pub use crate::policy::lru::LruCache;
pub use crate::policy::lru_k::LruKCache;
pub use crate::policy::sharded_lru::ShardedLruCache;
pub use crate::policy::tiny_lfu::WTinyLfuCache;
pub use crate::traits::CachePolicy;
