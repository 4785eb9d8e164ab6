use crate::error::ClientError;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait KvClient: Send + Sync {
    async fn set(
        &self,
        hash_key: &[u8],
        sort_key: &[u8],
        value: &[u8],
        timeout: Duration,
    ) -> Result<(), ClientError>;

    async fn del(&self, hash_key: &[u8], sort_key: &[u8], timeout: Duration)
    -> Result<(), ClientError>;

    /// Human-readable text of a client status code.
    fn error_string(&self, code: i32) -> String;
}

/// Writer of geo index entries derived from a source record.
#[async_trait]
pub trait GeoClient: Send + Sync {
    async fn set(
        &self,
        hash_key: &[u8],
        sort_key: &[u8],
        value: &[u8],
        timeout: Duration,
    ) -> Result<(), ClientError>;
}
