use std::process::{Command, Output};

use tracing::debug;

use crate::core::error::SplitError;

/// Run an external tool to completion, failing on a non-zero exit
///
/// # Errors
///
/// Returns `SplitError::ExternalTool` if the tool cannot be started or exits
/// unsuccessfully.
pub fn run_tool(tool: &str, command: &mut Command) -> Result<Output, SplitError> {
    debug!("Running {command:?}");
    let output = command.output().map_err(|e| SplitError::ExternalTool {
        tool: tool.to_string(),
        status: "not started".to_string(),
        stderr: e.to_string(),
    })?;
    if !output.status.success() {
        return Err(SplitError::tool_failed(tool, &output));
    }
    Ok(output)
}
