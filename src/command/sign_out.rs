// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;

use crate::error::Result;

const SETTLE: Duration = Duration::from_secs(5);

/// Sign out.
#[derive(Debug, Parser)]
pub(crate) struct Command;

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context) -> Result<()> {
        if !ctx.gate.is_authenticated() {
            println!("Not signed in");
            return Ok(());
        }

        ctx.gate.sign_out().await?;
        let _session = ctx
            .gate
            .wait_until(|session| !session.is_authenticated(), SETTLE)
            .await?;
        println!("Signed out");
        Ok(())
    }
}
