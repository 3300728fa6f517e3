//! `Bash` tool: execute a shell command.
//!
//! Returns stdout followed by stderr, whatever the exit status. Each
//! invocation is bounded by the policy timeout; on unix the command runs
//! in its own process group, and the whole group is killed when the
//! timeout elapses.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use loopclaw_core::error::ToolError;
use loopclaw_core::tool::{Tool, ToolArguments, ToolResult, required_str};
use tokio::process::Command;
use tracing::{debug, warn};

/// Limits applied to the `Bash` tool.
#[derive(Debug, Clone)]
pub struct ShellPolicy {
    /// If non-empty, only these base commands are allowed.
    pub allowed_commands: Vec<String>,

    /// Upper bound on a single command.
    pub timeout: Duration,
}

/// Characters that let one command line start another process.
const SHELL_OPERATORS: &[&str] = &[";", "&", "|", "`", "$(", ">", "<", "\n", "\r"];

impl ShellPolicy {
    /// Any command may run.
    pub fn unrestricted(timeout: Duration) -> Self {
        Self {
            allowed_commands: Vec::new(),
            timeout,
        }
    }

    /// Why `command` may not run, if it may not.
    ///
    /// With an allow-list in place, chaining, pipes, substitution and
    /// redirection are refused outright, so the first word is the only
    /// program the line can start.
    fn check(&self, command: &str) -> Result<(), String> {
        if self.allowed_commands.is_empty() {
            return Ok(());
        }

        if let Some(op) = SHELL_OPERATORS.iter().find(|op| command.contains(**op)) {
            return Err(format!(
                "Shell operator {op:?} is not allowed while an allowlist is set"
            ));
        }

        let base_cmd = command.split_whitespace().next().unwrap_or("");
        if self.allowed_commands.iter().any(|a| a == base_cmd) {
            Ok(())
        } else {
            Err(format!("Command '{base_cmd}' not in allowlist"))
        }
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        self.check(command).is_ok()
    }
}

/// Execute shell commands through `sh -c` (`cmd /C` on Windows).
pub struct ShellTool {
    policy: ShellPolicy,
}

impl ShellTool {
    pub fn new(policy: ShellPolicy) -> Self {
        Self { policy }
    }

    fn command(command: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can reach everything the shell started.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

/// Kill every process in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        return;
    };
    // SAFETY: killpg has no memory-safety preconditions.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "Bash"
    }

    fn description(&self) -> &str {
        "Execute a shell command"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<ToolResult, ToolError> {
        let command = required_str(arguments, "command")?;

        if let Err(reason) = self.policy.check(command) {
            return Err(ToolError::PermissionDenied {
                tool_name: "Bash".into(),
                reason,
            });
        }

        debug!(command = %command, "Executing shell command");

        let child = Self::command(command)
            .spawn()
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "Bash".into(),
                reason: e.to_string(),
            })?;
        let pid = child.id();

        let output = match tokio::time::timeout(self.policy.timeout, child.wait_with_output()).await
        {
            Ok(output) => output,
            Err(_) => {
                warn!(command = %command, "Command timed out");
                kill_process_group(pid);
                return Err(ToolError::Timeout {
                    tool_name: "Bash".into(),
                    timeout_secs: self.policy.timeout.as_secs(),
                });
            }
        };

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let success = output.status.success();

                if !success {
                    let code = output.status.code().unwrap_or(-1);
                    debug!(command = %command, exit_code = code, "Command exited non-zero");
                }

                Ok(ToolResult {
                    call_id: String::new(),
                    success,
                    output: format!("{stdout}{stderr}"),
                })
            }
            Err(e) => Err(ToolError::ExecutionFailed {
                tool_name: "Bash".into(),
                reason: e.to_string(),
            }),
        }
    }
}
