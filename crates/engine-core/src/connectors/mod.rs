//! Contracts of the cluster collaborators the engine drives.
//!
//! Implementations live outside this workspace (the real KV client, meta
//! client and RPC transport); `engine-tests` provides in-memory ones.

pub mod command;
pub mod kv;
pub mod meta;
pub mod scanner;
