// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ildbg`: managed-runtime debugger as an MCP stdio server.

use anyhow::Context;
use clap::Parser;
use ildbg_binding::{RuntimeBinding, ShimBinding};
use ildbg_core::SystemClock;
use ildbg_engine::{Engine, EngineConfig, EngineDeps};
use ildbg_server::{env, Server, Tools};
use ildbg_symbols::{MetadataSource, SymbolSource, SymbolStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ildbg", version, about = "Managed-runtime debugger MCP server")]
struct Args {
    /// Log filter directive (overrides ILDBG_LOG), e.g. "debug" or
    /// "ildbg_engine=trace".
    #[arg(long)]
    log_level: Option<String>,

    /// Write logs to a file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(args: &Args) -> anyhow::Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let directive = args
        .log_level
        .clone()
        .unwrap_or_else(env::log_directive);
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("bad log directive {directive:?}"))?;

    // Stdout carries protocol frames; logs must never land there.
    match &args.log_file {
        Some(path) => {
            let directory = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "ildbg.log".to_string());
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(&args)?;

    let store = Arc::new(SymbolStore::new());
    let deps = EngineDeps {
        binding: Arc::new(ShimBinding::new()) as Arc<dyn RuntimeBinding>,
        symbols: Arc::clone(&store) as Arc<dyn SymbolSource>,
        metadata: store as Arc<dyn MetadataSource>,
    };
    let config = EngineConfig { eval_timeout: env::eval_timeout(), just_my_code: true };
    let (engine, events) = Engine::new(deps, SystemClock, config);
    tokio::spawn(Arc::clone(&engine).run_events(events));

    tracing::info!(version = env::SERVER_VERSION, "ildbg MCP server starting");
    let server = Server::new(Tools::new(engine));
    server.run(tokio::io::stdin(), tokio::io::stdout()).await;
    Ok(())
}
