//! Built-in tool implementations for loopclaw.
//!
//! Three tools, named exactly as the model sees them:
//! - `Read`: return a file's contents
//! - `Write`: create or overwrite a file
//! - `Bash`: run a shell command and return its combined output
//!
//! These tools have the full authority of the process. The only optional
//! guard is the command allow-list in [`ShellPolicy`].

pub mod file_read;
pub mod file_write;
pub mod shell;

use std::time::Duration;

use loopclaw_core::tool::ToolRegistry;

pub use file_read::FileReadTool;
pub use file_write::{FileWriteTool, WRITE_CONFIRMATION};
pub use shell::{ShellPolicy, ShellTool};

/// Create the registry advertised to the model: `Read`, `Write`, `Bash`.
pub fn default_registry(shell: ShellPolicy) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(FileReadTool));
    registry.register(Box::new(FileWriteTool));
    registry.register(Box::new(ShellTool::new(shell)));
    registry
}

/// Registry with an unrestricted shell and the given command timeout.
pub fn unrestricted_registry(command_timeout: Duration) -> ToolRegistry {
    default_registry(ShellPolicy::unrestricted(command_timeout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_exposes_three_tools_in_order() {
        let registry = unrestricted_registry(Duration::from_secs(5));
        assert_eq!(registry.names(), vec!["Read", "Write", "Bash"]);

        let defs = registry.definitions();
        assert_eq!(defs[0].parameters["required"], serde_json::json!(["file_path"]));
        assert_eq!(
            defs[1].parameters["required"],
            serde_json::json!(["file_path", "content"])
        );
        assert_eq!(defs[2].parameters["required"], serde_json::json!(["command"]));
    }
}
