// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use log::{debug, info};
use tokio::time;

use crate::{
    auth,
    error::{self, Result},
    files::{FileDescriptor, PendingFiles},
    gate::Gate,
    metadata,
    notify::{Notice, Notifier},
};

pub(crate) const DEFAULT_ANALYSIS_DELAY: Duration = Duration::from_secs(2);

/// The upload and history panels. Everything here goes through the gate
/// first.
pub(crate) struct Workspace<'gate, S: auth::Service, N: Notifier> {
    gate: &'gate Gate<S, N>,
    pending: PendingFiles,
    analysis_delay: Duration,
}

impl<'gate, S: auth::Service, N: Notifier> Workspace<'gate, S, N> {
    pub(crate) fn new(gate: &'gate Gate<S, N>, analysis_delay: Duration) -> Self {
        Self {
            gate,
            pending: PendingFiles::default(),
            analysis_delay,
        }
    }

    pub(crate) fn pending(&self) -> &[FileDescriptor] {
        self.pending.as_slice()
    }

    fn stage(
        &mut self,
        files: Vec<FileDescriptor>,
        title: &str,
    ) -> Result<(), error::Authorization> {
        self.gate.authorize_action(Some(files.as_slice()))?;

        let count = files.len();
        self.pending.replace(files);
        debug!("Staged {} file(s)", count);
        self.gate.notifier().notify(Notice::normal(
            title,
            format!("{count} files added for analysis"),
        ));
        Ok(())
    }

    pub(crate) fn handle_drop(&mut self, files: Vec<FileDescriptor>) -> Result<(), error::Authorization> {
        self.stage(files, "Files uploaded")
    }

    pub(crate) fn handle_select(&mut self, files: Vec<FileDescriptor>) -> Result<(), error::Authorization> {
        self.stage(files, "Files selected")
    }

    /// Send the staged documents off for analysis.
    pub(crate) async fn handle_analyze(&mut self) -> Result<()> {
        self.gate.authorize_action(Some(self.pending.as_slice()))?;

        if self.pending.is_empty() {
            self.gate.notifier().notify(Notice::normal(
                "Nothing to analyze",
                "Select documents before starting an analysis.",
            ));
            return Err(error::Error::NothingToAnalyze);
        }

        for file in self.pending.as_slice() {
            debug!("Submitting {}", file.path().display());
        }
        info!("Submitted {} document(s) for analysis", self.pending.len());
        self.gate.notifier().notify(Notice::normal(
            "Analyzing documents",
            "The documents were sent for analysis",
        ));

        // There is no analysis backend yet.
        time::sleep(self.analysis_delay).await;
        Ok(())
    }

    pub(crate) fn history(&self) -> Result<(&'static str, &'static str), error::Authorization> {
        self.gate.authorize_action(None)?;
        Ok((metadata::HISTORY_TITLE, metadata::HISTORY_PLACEHOLDER))
    }
}
