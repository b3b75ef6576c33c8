// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{error::Result, metadata};

/// Show who is signed in.
#[derive(Debug, Parser)]
pub(crate) struct Command;

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context) -> Result<()> {
        println!("{}", metadata::PAGE_TITLE);
        println!("{}", metadata::PAGE_SUBTITLE);
        println!();
        match ctx.gate.session().identity() {
            Some(identity) => println!("Signed in as {} ({})", identity.email(), identity.id()),
            None => println!("Not signed in"),
        }
        Ok(())
    }
}
