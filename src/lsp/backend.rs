use lsp_types::{InitializeParams, InitializeResult};

/// The component that actually answers LSP methods.
///
/// One instance is owned by each connection, so implementations may keep
/// per-client state (for example whether `initialize` has been seen).
#[async_trait::async_trait]
pub trait CapabilityProvider: Send {
    async fn initialize(&mut self, params: InitializeParams) -> anyhow::Result<InitializeResult>;

    async fn initialized(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
