use crate::error::EditorLaunchError;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, info};
use which::which;

/// A parsed and resolved editor invocation for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    pub program: String,
    pub binary: PathBuf,
    pub args: Vec<String>,
}

impl EditorCommand {
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(&self.args);
        command
    }

    /// Runs the editor in the foreground and waits for it to exit.
    pub fn run(&self) -> Result<ExitStatus, EditorLaunchError> {
        info!(program = %self.program, args = ?self.args, "launching editor");
        self.command()
            .status()
            .map_err(|source| EditorLaunchError::Launch {
                program: self.program.clone(),
                source,
            })
    }
}

fn split_editor(editor: &str) -> Result<(String, Vec<String>), EditorLaunchError> {
    let parts =
        shell_words::split(editor).map_err(|_| EditorLaunchError::Malformed(editor.to_string()))?;
    let mut parts = parts.into_iter();
    let program = parts
        .next()
        .filter(|program| !program.is_empty())
        .ok_or_else(|| EditorLaunchError::Malformed(editor.to_string()))?;
    Ok((program, parts.collect()))
}

/// Resolves the editor's program on `PATH` without starting it.
pub fn check_editor(editor: &str) -> Result<PathBuf, EditorLaunchError> {
    let (program, _) = split_editor(editor)?;
    which(&program).map_err(|_| EditorLaunchError::NotFound(program))
}

/// `editor` may carry its own arguments (`"code --wait"`); the repository path
/// is always appended last.
pub fn prepare_editor_command(
    editor: &str,
    repo_path: &Path,
) -> Result<EditorCommand, EditorLaunchError> {
    let (program, mut args) = split_editor(editor)?;
    let binary = which(&program).map_err(|_| EditorLaunchError::NotFound(program.clone()))?;
    args.push(repo_path.display().to_string());
    debug!(program = %program, binary = %binary.display(), "editor command prepared");
    Ok(EditorCommand {
        program,
        binary,
        args,
    })
}
