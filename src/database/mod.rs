pub mod kv_store;
pub mod memory_store;
pub mod playlist;
pub mod redis_connection;

pub use kv_store::*;
pub use memory_store::MemoryStore;
pub use playlist::*;
pub use redis_connection::RedisDatabase;
