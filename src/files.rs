// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use tabled::Tabled;

/// A document the user picked or dropped. Only the handle is kept; the
/// contents are never read here.
#[derive(Clone, Debug, PartialEq, Eq, Tabled)]
pub(crate) struct FileDescriptor {
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "Path", display_with = "Self::format_path")]
    pub(crate) path: PathBuf,
}

impl FileDescriptor {
    pub(crate) fn from_path<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        Self { name, path }
    }

    // LINT: Tabled hands us a reference to the field itself.
    #[allow(clippy::ptr_arg)]
    fn format_path(path: &PathBuf) -> String {
        path.display().to_string()
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

/// The documents staged for the next analysis, in the order they were given.
#[derive(Debug, Default)]
pub(crate) struct PendingFiles {
    files: Vec<FileDescriptor>,
}

impl PendingFiles {
    /// Staging always starts over; a new selection never adds to an old one.
    pub(crate) fn replace(&mut self, files: Vec<FileDescriptor>) {
        self.files = files;
    }

    pub(crate) fn as_slice(&self) -> &[FileDescriptor] {
        &self.files
    }

    pub(crate) fn len(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
