use anyhow::bail;
use lsp_types::{
    CompletionOptions, InitializeParams, InitializeResult, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind, Url, WorkspaceFolder,
    WorkspaceFoldersServerCapabilities, WorkspaceServerCapabilities,
};
use tracing::info;

use crate::lsp::CapabilityProvider;

/// Per-connection provider that advertises a fixed capability set and
/// remembers the client's workspace.
#[derive(Debug, Default)]
pub struct WorkspaceProvider {
    root_uri: Option<Url>,
    workspace_folders: Vec<WorkspaceFolder>,
    initialize_seen: bool,
    initialized: bool,
}

impl WorkspaceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_uri(&self) -> Option<&Url> {
        self.root_uri.as_ref()
    }

    pub fn workspace_folders(&self) -> &[WorkspaceFolder] {
        &self.workspace_folders
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(
                TextDocumentSyncKind::FULL,
            )),
            completion_provider: Some(CompletionOptions {
                resolve_provider: Some(true),
                ..Default::default()
            }),
            workspace: Some(WorkspaceServerCapabilities {
                workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                    supported: Some(true),
                    change_notifications: None,
                }),
                file_operations: None,
            }),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl CapabilityProvider for WorkspaceProvider {
    #[allow(deprecated)]
    async fn initialize(&mut self, params: InitializeParams) -> anyhow::Result<InitializeResult> {
        if self.initialize_seen {
            bail!("server already initialized");
        }
        self.initialize_seen = true;
        self.root_uri = params.root_uri;
        self.workspace_folders = params.workspace_folders.unwrap_or_default();
        info!(
            root_uri = ?self.root_uri.as_ref().map(Url::as_str),
            folders = self.workspace_folders.len(),
            "initialize"
        );

        Ok(InitializeResult {
            capabilities: Self::capabilities(),
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&mut self) -> anyhow::Result<()> {
        self.initialized = true;
        Ok(())
    }
}
