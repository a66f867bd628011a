pub mod flaky_remote;
pub mod recording_pages;

pub use flaky_remote::*;
pub use recording_pages::*;
