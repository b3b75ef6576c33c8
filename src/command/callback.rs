// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use url::Url;

use crate::{
    error::Result,
    notify::{Notice, Notifier as _},
};

const SETTLE: Duration = Duration::from_secs(5);

/// Finish signing in using the address the identity provider sent you back
/// to.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The full address, including everything after `#`.
    #[arg(value_parser = Url::parse)]
    url: Url,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &mut super::Context) -> Result<()> {
        let identity = match ctx.service.complete_sign_in(&self.url).await {
            Ok(identity) => identity,
            Err(e) => {
                ctx.gate
                    .notifier()
                    .notify(Notice::destructive("Sign-in failed", e.to_string()));
                return Err(e.into());
            }
        };

        // Someone else may already be signed in; wait for this sign-in to land.
        let _session = ctx
            .gate
            .wait_until(|session| session.identity() == Some(&identity), SETTLE)
            .await?;
        println!("Signed in as {identity}");
        Ok(())
    }
}
