// Connector-type executor RPC
//
// The executor's internals are opaque: one descriptor goes out, one refreshed descriptor comes
// back. Production code uses `HttpExecutor`; the smoke runner and tests use `LoopbackExecutor` or
// stubs.

pub mod http;
pub mod loopback;

use crate::error::ExecutorError;
use crate::forms::form::FormData;
use crate::models::descriptor::ConnectorDescriptor;
use async_trait::async_trait;

pub use http::HttpExecutor;
pub use loopback::LoopbackExecutor;

#[async_trait]
pub trait ConnectorExecutor: Send + Sync {
    /// Run the step named by `descriptor.current_step_name` and return the
    /// refreshed descriptor.
    async fn execute(
        &self,
        descriptor: ConnectorDescriptor,
    ) -> Result<ConnectorDescriptor, ExecutorError>;

    /// Load the descriptor of an already created system (reopened run).
    async fn load(
        &self,
        descriptor: ConnectorDescriptor,
    ) -> Result<ConnectorDescriptor, ExecutorError>;
}

/// Single-request save used by multi-tab detail screens.
#[async_trait]
pub trait DetailSaveClient: Send + Sync {
    async fn save(&self, resource: &str, payload: FormData) -> Result<FormData, ExecutorError>;
}
