//! Redis connectivity and server-side scripts

pub mod pool;
pub mod scripts;

pub use pool::RedisPool;
