// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{error::Result, workspace::Workspace};

/// Show past analyses.
#[derive(Debug, Parser)]
pub(crate) struct Command;

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context) -> Result<()> {
        let workspace = Workspace::new(&ctx.gate, ctx.analysis_delay);
        let (title, body) = workspace.history()?;
        println!("{title}");
        println!("{body}");
        Ok(())
    }
}
