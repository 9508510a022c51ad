use core::future::Future;
use std::{
    io::{self, Write as _},
    process::ExitCode,
};

use anyhow::Result;
use archive_checker::{ArchiveChecker, CheckConfig, CheckSummary, TextReporter};
use block_store::open_store;
use checker_version::APPLICATION_VERSION_WITH_PLATFORM;
use clap::{Error as ClapError, Parser as _};
use log::{error, info, warn};
use tokio::{runtime::Builder, select, task};
use tokio_util::sync::CancellationToken;

use crate::{
    block_stats::BlockStatsPrinter,
    check_blocks_args::{CheckBlocksArgs, CheckBlocksConfig},
};

mod block_stats;
mod check_blocks_args;

// Distinguishes a damaged archive from a check that could not run.
const DAMAGED_ARCHIVE_EXIT_CODE: u8 = 2;

fn main() -> ExitCode {
    match try_main() {
        Ok(summary) if summary.hole_found || summary.has_fork_issue() => {
            ExitCode::from(DAMAGED_ARCHIVE_EXIT_CODE)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            error.downcast_ref().map(ClapError::exit);
            error!("{error:?}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<CheckSummary> {
    let CheckBlocksConfig {
        store_url,
        check_config,
        always_write_style,
    } = CheckBlocksArgs::try_parse()?.into_config();

    binary_utils::initialize_logger(module_path!(), always_write_style)?;

    info!("starting {APPLICATION_VERSION_WITH_PLATFORM}");

    block_on(run(store_url, check_config))
}

fn block_on<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(future)
}

async fn run(store_url: String, check_config: CheckConfig) -> Result<CheckSummary> {
    let cancel = CancellationToken::new();

    let mut check = task::spawn_blocking({
        let cancel = cancel.clone();
        move || check_blocks(&store_url, check_config, &cancel)
    });

    select! {
        result = &mut check => result?,
        signal = wait_for_signal() => {
            signal?;
            warn!("received a signal, stopping the check");
            cancel.cancel();
            check.await?
        }
    }
}

fn check_blocks(
    store_url: &str,
    check_config: CheckConfig,
    cancel: &CancellationToken,
) -> Result<CheckSummary> {
    let store = open_store(store_url)?;
    let mut stdout = io::stdout().lock();

    writeln!(stdout, "Checking block holes on {store_url}")?;

    if check_config.print_details.reads_blocks() {
        writeln!(
            stdout,
            "Detailed printing requested: All block files will be read and checked for continuity. \
             This may take a while...",
        )?;
    }

    let mut reporter = TextReporter::new(stdout);

    ArchiveChecker::new(&*store, check_config)
        .with_observer(BlockStatsPrinter::new(io::stdout()))
        .run(&mut reporter, cancel)
}

async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}
