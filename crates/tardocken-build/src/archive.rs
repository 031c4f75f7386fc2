use std::borrow::Cow;
use std::fs::{self, File, Metadata};
use std::io;
use std::path::Path;

use tar::{Builder, EntryType, Header, HeaderMode};

use crate::ContextError;

/// Size of the name and linkname fields in a tar header.
const NAME_FIELD_LEN: usize = 100;

/// Name GNU tar gives the records carrying long names.
const LONG_LINK_NAME: &[u8] = b"././@LongLink";

/// In-memory tar stream that keeps archive names exactly as given.
///
/// `tar::Builder::append_path_with_name` drops `./` components, but the
/// context contract names entries `./`, `./src/`, `./Dockerfile`. Headers
/// are therefore filled here and handed to [`Builder::append`] as-is, with
/// GNU long-name records for names over 100 bytes.
pub struct ArchiveWriter {
    builder: Builder<Vec<u8>>,
    entries: usize,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            builder: Builder::new(Vec::new()),
            entries: 0,
        }
    }

    /// Appends the filesystem node at `path` under `name`.
    ///
    /// `meta` decides the entry type: directories get a trailing `/`,
    /// symlinks are stored as links, regular files carry their content.
    pub fn append(&mut self, name: &str, path: &Path, meta: &Metadata) -> Result<(), ContextError> {
        let file_type = meta.file_type();
        let name: Cow<'_, str> = if file_type.is_dir() && !name.ends_with('/') {
            Cow::Owned(format!("{name}/"))
        } else {
            Cow::Borrowed(name)
        };

        let mut header = Header::new_gnu();
        header.set_metadata_in_mode(meta, HeaderMode::Complete);

        if name.len() > NAME_FIELD_LEN {
            self.append_long_record(EntryType::GNULongName, name.as_bytes(), &name)?;
        }
        fill(&mut header.as_old_mut().name, name.as_bytes());

        if file_type.is_symlink() {
            let target = fs::read_link(path).map_err(|e| ContextError::ReadLink {
                path: path.to_path_buf(),
                source: e,
            })?;
            let target = target.to_string_lossy();
            if target.len() > NAME_FIELD_LEN {
                self.append_long_record(EntryType::GNULongLink, target.as_bytes(), &name)?;
            }
            fill(&mut header.as_old_mut().linkname, target.as_bytes());
        }

        header.set_cksum();

        let appended = if file_type.is_file() {
            let file = File::open(path).map_err(|e| ContextError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;
            self.builder.append(&header, file)
        } else {
            self.builder.append(&header, io::empty())
        };
        appended.map_err(|e| ContextError::Append {
            name: name.to_string(),
            source: e,
        })?;

        self.entries += 1;
        tracing::debug!(name = %name, "added entry");
        Ok(())
    }

    /// Appends the regular file at `path` under `name`, following symlinks
    /// so the archive always carries the file's content.
    pub fn append_file(&mut self, name: &str, path: &Path) -> Result<(), ContextError> {
        let meta = fs::metadata(path).map_err(|e| ContextError::Metadata {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !meta.is_file() {
            return Err(ContextError::NotAFile(path.to_path_buf()));
        }
        self.append(name, path, &meta)
    }

    /// Number of entries written so far, long-name records excluded.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Writes the end-of-archive records and returns the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>, ContextError> {
        self.builder
            .into_inner()
            .map_err(|e| ContextError::Finish { source: e })
    }

    fn append_long_record(
        &mut self,
        kind: EntryType,
        value: &[u8],
        name: &str,
    ) -> Result<(), ContextError> {
        let mut header = Header::new_gnu();
        fill(&mut header.as_old_mut().name, LONG_LINK_NAME);
        header.set_mode(0o644);
        header.set_uid(0);
        header.set_gid(0);
        header.set_mtime(0);
        header.set_size(value.len() as u64 + 1);
        header.set_entry_type(kind);
        header.set_cksum();

        let mut payload = Vec::with_capacity(value.len() + 1);
        payload.extend_from_slice(value);
        payload.push(0);

        self.builder
            .append(&header, payload.as_slice())
            .map_err(|e| ContextError::Append {
                name: name.to_owned(),
                source: e,
            })
    }
}

/// Copies as much of `bytes` as fits; the rest of the field stays NUL.
fn fill(field: &mut [u8], bytes: &[u8]) {
    let len = bytes.len().min(field.len());
    field[..len].copy_from_slice(&bytes[..len]);
}
