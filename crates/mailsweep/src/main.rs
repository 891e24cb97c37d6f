//! mailsweep — delete old messages from an IMAP mailbox.
//!
//! CLI wrapper around `mailsweep-core`: argument parsing, password
//! prompting, logging setup, Ctrl-C wiring, and report rendering. The
//! selection and deletion logic lives in the core crate.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use mailsweep_core::{
    CancelToken, CriterionSpec, ExecuteOptions, ImapMailbox, ImapMailboxConfig, MailboxSession,
    Report, RunStatus, SystemClock, TimeCriterion, sweep,
};
use mailsweep_imap::{Config, Security};

use cli::Args;

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "mailsweep=debug,mailsweep_core=debug,mailsweep_imap=debug"
    } else {
        "mailsweep=info,mailsweep_core=info,mailsweep_imap=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let password = match args.password.clone() {
        Some(password) => password,
        None => rpassword::prompt_password(format!("Enter password for {}: ", args.username))?,
    };

    let security = if args.no_tls {
        Security::None
    } else {
        Security::Implicit
    };
    let mut connection = Config::builder(&args.server).security(security);
    if let Some(port) = args.port {
        connection = connection.port(port);
    }

    let mut session = ImapMailbox::new(ImapMailboxConfig {
        connection: connection.build(),
        username: args.username.clone(),
        password,
    });

    if args.list_folders {
        return list_folders(&mut session).await;
    }

    let range = match &args.time_range {
        Some(pair) => Some((cli::parse_timestamp(&pair[0])?, cli::parse_timestamp(&pair[1])?)),
        None => None,
    };
    let criterion = TimeCriterion::build(&CriterionSpec {
        age_days: args.days,
        range,
    })?;

    if args.dry_run {
        info!("running in dry-run mode; nothing will be deleted");
    } else {
        warn!("running in deletion mode; matching messages will be permanently deleted");
    }

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("cancellation requested; finishing the current batch");
                cancel.cancel();
            }
        });
    }

    let options = ExecuteOptions {
        dry_run: args.dry_run,
        batch_size: args.batch_size,
    };
    let result = sweep(
        &mut session,
        &args.folder,
        &criterion,
        &options,
        &cancel,
        &SystemClock,
    )
    .await;
    session.disconnect().await;

    let report = result?;
    render_report(&report, args.dry_run);

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn list_folders(session: &mut ImapMailbox) -> anyhow::Result<ExitCode> {
    session.authenticate().await?;
    let folders = session.list_folders().await?;
    session.disconnect().await;

    info!(count = folders.len(), "folders on server");
    for folder in &folders {
        println!("  - {}", folder.mailbox.as_str());
    }
    Ok(ExitCode::SUCCESS)
}

fn render_report(report: &Report, dry_run: bool) {
    println!("Folder:   {}", report.folder);
    println!("Examined: {}", report.total_examined);
    println!("Matched:  {}", report.total_matched);

    if dry_run {
        println!("Would delete {} message(s):", report.skipped_count());
        for (descriptor, _) in &report.outcomes {
            println!("  {}", descriptor.describe());
        }
    } else {
        println!("Deleted:  {}", report.deleted_count());
        println!("Failed:   {}", report.failed_count());
        println!("Skipped:  {}", report.skipped_count());
        for (descriptor, reason) in report.failures() {
            println!("  failed: {} ({reason})", descriptor.describe());
        }
    }

    if let Some(note) = &report.truncation_note {
        println!("Note: {note}");
    }

    match &report.status {
        RunStatus::Completed => {}
        RunStatus::Cancelled => println!("Run cancelled; remaining messages were skipped."),
        RunStatus::Failed(reason) => println!("Run failed: {reason}"),
    }
}
