use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;

use crate::command::{run_tool, CommandError};
use crate::config::ToolConfig;
use crate::contract::PageConverter;

/// [`PageConverter`] backed by `rmc -f rm -t pdf -o <output> <input>`.
pub struct Rmc {
    tools: ToolConfig,
}

impl Rmc {
    pub fn new(tools: ToolConfig) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl PageConverter for Rmc {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), CommandError> {
        let args: [&OsStr; 7] = [
            OsStr::new("-f"),
            OsStr::new("rm"),
            OsStr::new("-t"),
            OsStr::new("pdf"),
            OsStr::new("-o"),
            output.as_os_str(),
            input.as_os_str(),
        ];
        run_tool(&self.tools.rmc, args, None, self.tools.timeout).await?;
        Ok(())
    }
}
