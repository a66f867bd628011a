pub mod connection_pool;

pub use connection_pool::{ConnectionPool, StoreLocation};
