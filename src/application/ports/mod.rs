pub mod connectivity;
pub mod local_store;
pub mod page_cache;
pub mod remote_store;
