use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// Runs a program to completion and captures its output.
///
/// Every call the engine client makes goes through this seam so that tests can
/// script the engine's answers instead of shelling out.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

impl<T: CommandExecutor + ?Sized> CommandExecutor for &T {
    fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        (**self).execute(program, args)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("Failed to execute command: {} {:?}", program, args))?;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Deterministic command executor used in tests where shelling out is undesirable.
///
/// Responses are matched by argument prefix, first registered rule wins.
/// Unmatched calls succeed with empty output. Every call is recorded.
#[derive(Debug, Default)]
pub struct ScriptedCommandExecutor {
    rules: Vec<(Vec<String>, CommandOutput)>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, args_prefix: &[&str], output: CommandOutput) -> Self {
        self.rules.push((
            args_prefix.iter().map(|arg| arg.to_string()).collect(),
            output,
        ));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Recorded calls whose arguments start with `args_prefix`.
    pub fn calls_matching(&self, args_prefix: &[&str]) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| has_prefix(&call.args, args_prefix))
            .collect()
    }
}

impl CommandExecutor for ScriptedCommandExecutor {
    fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Invocation {
                program: program.to_string(),
                args: args.to_vec(),
            });

        let output = self
            .rules
            .iter()
            .find(|(prefix, _)| args.starts_with(prefix))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::ok(""));
        Ok(output)
    }
}

fn has_prefix(args: &[String], prefix: &[&str]) -> bool {
    prefix.len() <= args.len() && prefix.iter().zip(args).all(|(p, a)| p == a)
}
