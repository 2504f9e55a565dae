//! The seam between the interceptor and the real network.

use async_trait::async_trait;

use crate::Error;
use crate::http::{FetchRequest, WorkerResponse};

/// Performs live fetches on behalf of the interceptor.
///
/// Implementations return every HTTP response, whatever its status, and
/// reserve `Err` for requests that produced no response at all.
#[async_trait]
pub trait Network: Send + Sync + 'static {
    async fn fetch(&self, request: &FetchRequest) -> Result<WorkerResponse, Error>;
}
