use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::command::{run_tool, CommandError};
use crate::config::ToolConfig;
use crate::contract::RemoteStore;
use crate::listing::RemotePath;

/// [`RemoteStore`] backed by the `rmapi` command line client.
///
/// `rmapi` must already be authenticated against the cloud account.
pub struct Rmapi {
    tools: ToolConfig,
}

impl Rmapi {
    pub fn new(tools: ToolConfig) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl RemoteStore for Rmapi {
    async fn list(&self) -> Result<String, CommandError> {
        info!(program = %self.tools.rmapi.display(), "Requesting remote listing");
        run_tool(&self.tools.rmapi, ["find", "."], None, self.tools.timeout).await
    }

    async fn fetch(&self, remote: &RemotePath, workdir: &Path) -> Result<(), CommandError> {
        info!(remote = %remote, workdir = %workdir.display(), "Downloading archive");
        run_tool(
            &self.tools.rmapi,
            ["get", remote.as_str()],
            Some(workdir),
            self.tools.timeout,
        )
        .await?;
        Ok(())
    }
}
