pub mod memory_cache;
pub mod page_cache;

pub use memory_cache::MemoryCacheService;
pub use page_cache::{MemoryPageCache, StaticPageSource};
