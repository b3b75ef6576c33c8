// SPDX-FileCopyrightText: 2022 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use url::Url;

use crate::{auth, error::Result, gate::Gate, notify, storage};

pub(crate) mod analyze;
pub(crate) mod callback;
pub(crate) mod history;
pub(crate) mod sign_in;
pub(crate) mod sign_out;
pub(crate) mod status;
pub(crate) mod upload;

pub(crate) type Service = auth::Hosted<Box<dyn storage::Storage<auth::Record>>, auth::Print>;

/// Everything a command gets to work with during one run.
pub(crate) struct Context {
    pub(crate) service: Arc<Service>,
    pub(crate) gate: Gate<Service, notify::Terminal>,
    pub(crate) redirect_to: Url,
    pub(crate) analysis_delay: Duration,
}

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, ctx: &mut Context) -> Result<()>;
}
