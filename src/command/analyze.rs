// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use async_trait::async_trait;
use clap::Parser;

use crate::{error::Result, files::FileDescriptor, workspace::Workspace};

/// Select documents and send them for analysis.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The documents to analyze.
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    files: Vec<PathBuf>,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context) -> Result<()> {
        let mut workspace = Workspace::new(&ctx.gate, ctx.analysis_delay);
        workspace.handle_select(self.files.into_iter().map(FileDescriptor::from_path).collect())?;
        workspace.handle_analyze().await?;

        println!("Analysis submitted for {} document(s)", workspace.pending().len());
        Ok(())
    }
}
