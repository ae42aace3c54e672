//! Invocation of the user's interactive editor.

use anyhow::{bail, Context, Result};
use std::{
    io::Write as _,
    path::Path,
    process::{Command, Stdio},
};
use tracing::info;

/// Something that lets the user change a file, returning once they are done.
pub trait Editor {
    fn edit(&self, path: &Path) -> Result<()>;
}

impl<F> Editor for F
where
    F: Fn(&Path) -> Result<()>,
{
    fn edit(&self, path: &Path) -> Result<()> {
        self(path)
    }
}

/// Runs an external program with the file path appended to its arguments.
#[derive(Debug, Clone)]
pub struct CommandEditor {
    command: String,
}

impl CommandEditor {
    /// `command` is split on whitespace; the first word is the program.
    pub fn new(command: &str) -> Result<Self> {
        if command.split_whitespace().next().is_none() {
            bail!("the editor command is empty");
        }
        Ok(Self {
            command: command.to_string(),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Editor for CommandEditor {
    fn edit(&self, path: &Path) -> Result<()> {
        let mut words = self.command.split_whitespace();
        let program = words.next().context("the editor command is empty")?;

        let mut command = Command::new(program);
        command
            .args(words)
            .arg(path)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        info!("edit: {} {}", self.command, path.display());
        let status = command
            .status()
            .with_context(|| format!("failed to start editor: {}", self.command))?;
        if !status.success() {
            bail!("editor `{}` failed: {}", self.command, status);
        }
        Ok(())
    }
}

/// Turn a description into something that is safe to use in a file name.
pub(crate) fn file_tag(description: &str) -> String {
    description
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Stage `contents` in a new file in `dir`, let `editor` change it and return
/// the result. The file is removed again on every path out of this function.
pub(crate) fn edit_bytes(
    editor: &dyn Editor,
    dir: &Path,
    name: &str,
    suffix: &str,
    contents: &[u8],
) -> Result<Vec<u8>> {
    let mut file = tempfile::Builder::new()
        .prefix(&format!("{}-", file_tag(name)))
        .suffix(suffix)
        .tempfile_in(dir)
        .with_context(|| format!("failed to create a file for editing {}", name))?;
    file.write_all(contents)
        .and_then(|_| file.flush())
        .with_context(|| format!("failed to write {}", file.path().display()))?;

    editor.edit(file.path())?;

    // Editors may replace the file rather than write into it, so read by path.
    std::fs::read(file.path())
        .with_context(|| format!("failed to read back {}", file.path().display()))
}

/// Like [`edit_bytes`], for text.
pub(crate) fn edit_text(
    editor: &dyn Editor,
    dir: &Path,
    name: &str,
    suffix: &str,
    text: &str,
) -> Result<String> {
    let bytes = edit_bytes(editor, dir, name, suffix, text.as_bytes())?;
    String::from_utf8(bytes).with_context(|| format!("edited {} is not valid UTF-8", name))
}
