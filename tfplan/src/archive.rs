//! Plan files on disk.
//!
//! `terraform plan -out` writes a zip archive holding the `tfplan` message
//! next to the prior state, the refreshed state and a snapshot of the
//! configuration. A file that is not a zip archive is taken to be a bare
//! `tfplan` message.

use anyhow::{Context, Result};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tracing::info;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::store;

/// Name of the archive member holding the plan message.
pub const PLAN_MEMBER: &str = "tfplan";

const LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";

/// A file of a plan archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub contents: Vec<u8>,
}

impl Member {
    pub fn is_plan(&self) -> bool {
        is_plan_member(&self.name)
    }
}

/// Whether an archive member called `name` holds the plan message.
pub fn is_plan_member(name: &str) -> bool {
    name == PLAN_MEMBER || name.ends_with("/tfplan")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanFile {
    /// Members in archive order. Directory entries are not kept.
    Archive(Vec<Member>),
    Bare(Vec<u8>),
}

impl PlanFile {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if !(bytes.starts_with(LOCAL_HEADER) || bytes.starts_with(EMPTY_ARCHIVE)) {
            return Ok(PlanFile::Bare(bytes));
        }

        let mut archive =
            ZipArchive::new(Cursor::new(bytes.as_slice())).context("failed to open plan archive")?;
        let mut members = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .with_context(|| format!("failed to read plan archive entry {}", index))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut contents = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut contents)
                .with_context(|| format!("failed to inflate {}", name))?;
            info!("inflate: {}", name);
            members.push(Member { name, contents });
        }
        Ok(PlanFile::Archive(members))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let members = match self {
            PlanFile::Bare(bytes) => return Ok(bytes.clone()),
            PlanFile::Archive(members) => members,
        };

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for member in members {
            info!("deflate: {}", member.name);
            writer
                .start_file(member.name.as_str(), options)
                .with_context(|| format!("failed to add {} to plan archive", member.name))?;
            writer
                .write_all(&member.contents)
                .with_context(|| format!("failed to deflate {}", member.name))?;
        }
        let cursor = writer.finish().context("failed to finish plan archive")?;
        Ok(cursor.into_inner())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = store::read_bytes(path)?;
        Self::from_bytes(bytes).with_context(|| format!("failed to read plan file {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        store::write_bytes(path, &self.to_bytes()?)
    }

    /// The plan message: the `tfplan` member of an archive, or the whole file.
    pub fn plan(&self) -> Option<&[u8]> {
        match self {
            PlanFile::Bare(bytes) => Some(bytes),
            PlanFile::Archive(members) => members
                .iter()
                .find(|member| member.is_plan())
                .map(|member| member.contents.as_slice()),
        }
    }
}
