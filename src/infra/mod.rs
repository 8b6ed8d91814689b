pub mod logging;
pub mod provider;
pub mod runtime;
pub mod scheduler;
pub mod storage;
