//! One editing session over a plan file.

use anyhow::{bail, Context, Result};
use prost::Message;
use std::path::Path;
use tracing::{info, info_span, warn};

use crate::{
    archive::{is_plan_member, Member, PlanFile},
    codec::{self, ValueCodec},
    combine::combine,
    editor::{self, CommandEditor, Editor},
    plan::{DynamicValue, Plan},
    split::{split_skeleton, split_values, ValueLocation},
};

/// What to edit with, and what to edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Command for text: the plan skeleton, typed values and the other files
    /// of a plan archive.
    pub text_editor: String,
    /// Command for values whose type could not be inferred.
    pub value_editor: String,
    /// Leave the archive members other than `tfplan` alone.
    pub plan_only: bool,
}

/// Name of the file the plan is edited in, minus its dynamic values.
const SKELETON_NAME: &str = "tfplan-sans-dynamic-values";

pub struct PlanEditor<'a> {
    text_editor: &'a dyn Editor,
    value_editor: &'a dyn Editor,
    work_dir: &'a Path,
    plan_only: bool,
}

impl<'a> PlanEditor<'a> {
    pub fn new(text_editor: &'a dyn Editor, value_editor: &'a dyn Editor, work_dir: &'a Path) -> Self {
        Self {
            text_editor,
            value_editor,
            work_dir,
            plan_only: false,
        }
    }

    pub fn plan_only(mut self, plan_only: bool) -> Self {
        self.plan_only = plan_only;
        self
    }

    /// Edit an encoded `tfplan` message.
    ///
    /// The plan is first edited as JSON without its dynamic values, then each
    /// dynamic value is edited on its own. Returns the re-encoded plan.
    pub fn edit_plan(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let plan = decode_whole_plan(bytes)?;

        let skeleton = self.edit_skeleton(&plan)?;

        let codec = ValueCodec::new(self.text_editor, self.value_editor, self.work_dir);
        let values = split_values(
            &plan,
            &mut |location: ValueLocation<'_>, value: &mut DynamicValue| -> Result<()> {
                codec.edit(value, &location.description())?;
                Ok(())
            },
        )?;

        let merged = combine(&skeleton, &values)?;
        Ok(merged.encode_to_vec())
    }

    fn edit_skeleton(&self, plan: &Plan) -> Result<Plan> {
        let mut text = serde_json::to_string_pretty(&split_skeleton(plan))
            .context("failed to render the plan as JSON")?;
        text.push('\n');

        let edited = editor::edit_text(self.text_editor, self.work_dir, SKELETON_NAME, ".json", &text)?;
        serde_json::from_str(&edited).context("failed to parse the edited plan")
    }

    /// Edit one file of a plan archive.
    pub fn edit_file(&self, name: &str, contents: &[u8]) -> Result<Vec<u8>> {
        if is_plan_member(name) {
            return self
                .edit_plan(contents)
                .with_context(|| format!("failed to edit {}", name));
        }
        if self.plan_only {
            return Ok(contents.to_vec());
        }

        let file_name = Path::new(name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        let suffix = Path::new(name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        editor::edit_bytes(self.text_editor, self.work_dir, &file_name, &suffix, contents)
    }

    pub fn edit_plan_file(&self, file: &mut PlanFile) -> Result<()> {
        match file {
            PlanFile::Bare(bytes) => {
                *bytes = self.edit_plan(bytes)?;
            }
            PlanFile::Archive(members) => {
                if !members.iter().any(Member::is_plan) {
                    warn!("the plan archive has no tfplan member");
                }
                for member in members.iter_mut() {
                    let span = info_span!("member", name = %member.name);
                    let _enter = span.enter();
                    member.contents = self.edit_file(&member.name, &member.contents)?;
                }
            }
        }
        Ok(())
    }

    /// Render an encoded plan the way it would be presented for editing.
    pub fn show(bytes: &[u8]) -> Result<String> {
        let plan = Plan::decode(bytes).context("failed to decode plan")?;

        let mut out = serde_json::to_string_pretty(&split_skeleton(&plan))
            .context("failed to render the plan as JSON")?;
        out.push('\n');

        split_values(
            &plan,
            &mut |location: ValueLocation<'_>, value: &mut DynamicValue| -> Result<()> {
                let description = location.description();
                let (strategy, text) = codec::decode(&value.msgpack)
                    .with_context(|| format!("cannot show dynamic value: {}", description))?;
                out.push_str(&format!("\n# {} ({})\n{}", description, strategy, text));
                Ok(())
            },
        )?;
        Ok(out)
    }
}

/// Decode a plan that is going to be written back. `prost` skips fields it
/// has no declaration for, so a plan that re-encodes shorter than it was
/// read carries fields that would be lost.
fn decode_whole_plan(bytes: &[u8]) -> Result<Plan> {
    let plan = Plan::decode(bytes).context("failed to decode plan")?;
    let known = plan.encoded_len();
    if known < bytes.len() {
        bail!(
            "the plan holds fields this version of tfplan does not know, {} of its {} bytes would be lost",
            bytes.len() - known,
            bytes.len()
        );
    }
    Ok(plan)
}

/// Edit the plan file at `source` and write the result to `destination`,
/// which may be the same path.
pub fn edit_plan_file(config: &Config, source: &Path, destination: &Path) -> Result<()> {
    let text_editor = CommandEditor::new(&config.text_editor)?;
    let value_editor = CommandEditor::new(&config.value_editor)?;
    info!("text editor: {}", text_editor.command());
    info!("value editor: {}", value_editor.command());

    let mut file = PlanFile::read(source)?;

    let work_dir = tempfile::Builder::new()
        .prefix("terraform-plan-edit")
        .tempdir()
        .context("failed to create a working directory")?;
    PlanEditor::new(&text_editor, &value_editor, work_dir.path())
        .plan_only(config.plan_only)
        .edit_plan_file(&mut file)?;

    file.write(destination)
}

/// Render the plan of the plan file at `path`.
pub fn show_plan_file(path: &Path) -> Result<String> {
    let file = PlanFile::read(path)?;
    let plan = file
        .plan()
        .with_context(|| format!("{} has no tfplan member", path.display()))?;
    PlanEditor::show(plan)
}
