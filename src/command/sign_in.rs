// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{auth::Provider, error::Result};

/// Start signing in with an identity provider.
///
/// This prints the address of the provider's sign-in page. Once the
/// provider sends you back, pass the address you land on to `callback`.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The identity provider to sign in with.
    #[arg(long, short, value_enum, default_value_t = Provider::Google)]
    provider: Provider,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context) -> Result<()> {
        if let Some(identity) = ctx.gate.session().identity() {
            println!("Already signed in as {identity}");
            return Ok(());
        }

        ctx.gate.sign_in(self.provider, &ctx.redirect_to).await?;
        Ok(())
    }
}
