// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_lifetimes,
    unused_qualifications,
    unused_results,
    anonymous_parameters,
    deprecated_in_future,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    keyword_idents,
    macro_use_extern_crate,
    missing_doc_code_examples,
    private_doc_tests,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::unseparated_literal_suffix,
    clippy::decimal_literal_representation,
    clippy::single_char_lifetime_names,
    clippy::fallible_impl_from,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::wildcard_enum_match_arm,
    clippy::deref_by_slicing,
    clippy::default_numeric_fallback,
    clippy::shadow_reuse,
    clippy::clone_on_ref_ptr,
    clippy::todo,
    clippy::string_add,
    clippy::use_debug,
    clippy::future_not_send
)]
#![cfg_attr(not(test), warn(clippy::panic_in_result_fn))]

mod auth;
mod command;
mod error;
mod files;
mod gate;
mod metadata;
mod notify;
mod session;
mod storage;
mod workspace;

use std::{process, sync::Arc, time::Duration};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use error::Result;
use gate::Gate;
use log::{error, info, warn};
use secrecy::SecretString;
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Status(command::status::Command),
    SignIn(command::sign_in::Command),
    Callback(command::callback::Command),
    SignOut(command::sign_out::Command),
    Upload(command::upload::Command),
    Analyze(command::analyze::Command),
    History(command::history::Command),
}

#[async_trait]
impl command::Command for Command {
    async fn execute(self, ctx: &mut command::Context) -> Result<()> {
        match self {
            Self::Status(cmd) => command::Command::execute(cmd, ctx).await,
            Self::SignIn(cmd) => command::Command::execute(cmd, ctx).await,
            Self::Callback(cmd) => command::Command::execute(cmd, ctx).await,
            Self::SignOut(cmd) => command::Command::execute(cmd, ctx).await,
            Self::Upload(cmd) => command::Command::execute(cmd, ctx).await,
            Self::Analyze(cmd) => command::Command::execute(cmd, ctx).await,
            Self::History(cmd) => command::Command::execute(cmd, ctx).await,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The base URL of the hosted authentication service.
    #[arg(long, env = "DOCGATE_URL", value_parser = Url::parse)]
    url: Option<Url>,

    /// The anonymous (publishable) key for the authentication service.
    #[arg(long, env = "DOCGATE_ANON_KEY", hide_env_values = true)]
    anon_key: Option<String>,

    /// Where the identity provider should send you after signing in.
    #[arg(long, env = "DOCGATE_REDIRECT_TO", default_value = "http://localhost:8080/", value_parser = Url::parse)]
    redirect_to: Url,

    /// Keep the session only for this run instead of saving it.
    #[arg(long)]
    no_persist_session: bool,

    /// How long the simulated analysis takes, in milliseconds.
    #[arg(long)]
    analysis_delay_ms: Option<u64>,

    #[clap(subcommand)]
    command: Command,
}

fn get_session_storage(args: &Args) -> Box<dyn storage::Storage<auth::Record>> {
    if !args.no_persist_session {
        if let Some(file_storage) = storage::File::new(metadata::SESSION_FILE_NAME) {
            info!("Keeping the session in {}", file_storage.path().display());
            return Box::new(file_storage);
        }
        warn!("There is no data directory to keep the session in, so it will only last for this run");
    }

    Box::new(storage::Memory::<auth::Record>::new())
}

async fn run(args: Args) -> Result<()> {
    let anon_key = args.anon_key.clone().map(SecretString::new);
    let service = Arc::new(auth::Hosted::new(
        args.url.clone(),
        anon_key.as_ref(),
        get_session_storage(&args),
        auth::Print,
    )?);

    let mut gate = Gate::new(Arc::clone(&service), notify::Terminal);
    gate.initialize().await?;

    let mut ctx = command::Context {
        service,
        gate,
        redirect_to: args.redirect_to,
        analysis_delay: args
            .analysis_delay_ms
            .map_or(workspace::DEFAULT_ANALYSIS_DELAY, Duration::from_millis),
    };
    let result = command::Command::execute(args.command, &mut ctx).await;
    ctx.gate.teardown();

    result
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("DOCGATE_LOG", "warn")
        .write_style("DOCGATE_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
