//! Scripted command runner for tests

use crate::error::Result;
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

enum Outcome {
    Files(Vec<(String, String)>),
    Fail { code: i32, output: String },
}

/// Records every command and plays back canned effects.
///
/// Commands are matched by prefix of their rendered command line. `git clone`
/// writes its files into the clone destination (the last argument); every
/// other command writes relative to its working directory. Unmatched
/// commands succeed without side effects.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<(String, Outcome)>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `command` succeeds and leaves `files` behind
    pub fn writes(mut self, command: &str, files: &[(&str, &str)]) -> Self {
        let files = files
            .iter()
            .map(|(path, content)| (path.to_string(), content.to_string()))
            .collect();
        self.rules.push((command.to_string(), Outcome::Files(files)));
        self
    }

    /// `command` exits with `code`
    pub fn fails(mut self, command: &str, code: i32, output: &str) -> Self {
        self.rules.push((
            command.to_string(),
            Outcome::Fail {
                code,
                output: output.to_string(),
            },
        ));
        self
    }

    /// Rendered command lines in call order
    pub fn calls(&self) -> Vec<String> {
        self.specs().iter().map(CommandSpec::display).collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(spec.clone());

        let line = spec.display();
        let Some((_, outcome)) = self.rules.iter().find(|(prefix, _)| line.starts_with(prefix))
        else {
            return Ok(CommandOutput::success());
        };

        match outcome {
            Outcome::Fail { code, output } => Ok(CommandOutput::failure(*code, output.clone())),
            Outcome::Files(files) => {
                let base = if spec.program == "git" && spec.args.first().is_some_and(|a| a == "clone") {
                    spec.args.last().map(PathBuf::from).unwrap_or_else(|| spec.cwd.clone())
                } else {
                    spec.cwd.clone()
                };
                std::fs::create_dir_all(&base)?;
                for (relative, content) in files {
                    let path = base.join(relative);
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, content)?;
                }
                Ok(CommandOutput::success())
            }
        }
    }
}
