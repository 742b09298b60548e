//! urldb CLI

mod cli;
mod commands;
mod error;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use std::io::Write;
use std::process::ExitCode;
use urldb_config::{Config, HttpConfig};
use urldb_probe::CheckOptions;
use urldb_probe::transport::{HttpOptions, HttpTransport};
use urldb_store::Database;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = ?e, "{}", *e);
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    let mut database = Database::open(&config.database).or_raise(|| ErrorKind::Database)?;

    match cli.command {
        Command::Add {
            url,
            lock_content,
            categories,
        } => {
            let transport = transport(&config.http)?;
            commands::add(&database, &transport, &url, lock_content, categories).await?;
        },
        Command::Check {
            selection,
            maps,
            quick,
        } => {
            let transport = transport(&config.http)?;
            let options = CheckOptions { verify_content: !quick };
            let mut stdout = std::io::stdout().lock();
            let failures =
                commands::check(&mut database, &transport, selection.into(), &maps, options, &mut stdout).await?;
            stdout.flush().or_raise(|| ErrorKind::Output)?;
            if failures > 0 {
                eprintln!("{failures} failures");
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::DumpUrls { selection } => {
            let mut stdout = std::io::stdout().lock();
            commands::dump_urls(&database, selection.into(), &mut stdout)?;
        },
    }
    Ok(ExitCode::SUCCESS)
}

fn transport(http: &HttpConfig) -> Result<HttpTransport> {
    let options = HttpOptions {
        timeout: http.timeout(),
        connect_timeout: http.connect_timeout(),
        user_agent: http.user_agent.clone(),
    };
    HttpTransport::new(&options).or_raise(|| ErrorKind::Probe)
}
