// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use async_trait::async_trait;
use clap::Parser;
use tabled::{settings::Style, Table};

use crate::{error::Result, files::FileDescriptor, workspace::Workspace};

/// Stage documents for analysis and list them.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Treat the files as dropped onto the upload area rather than picked.
    #[arg(long)]
    drop: bool,

    /// The documents to stage.
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    files: Vec<PathBuf>,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context) -> Result<()> {
        let mut workspace = Workspace::new(&ctx.gate, ctx.analysis_delay);
        let files = self
            .files
            .into_iter()
            .map(FileDescriptor::from_path)
            .collect();

        if self.drop {
            workspace.handle_drop(files)?;
        } else {
            workspace.handle_select(files)?;
        }

        println!(
            "{}",
            Table::new(workspace.pending()).with(Style::rounded())
        );
        Ok(())
    }
}
