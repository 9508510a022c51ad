use std::io::Write as _;

use anyhow::Result;
use chrono::{Local, SecondsFormat};
use env_logger::{Builder, Env, WriteStyle};
use log::LevelFilter;

/// Environment variable holding `env_logger` directives that override the defaults.
pub const LOG_ENV_VARIABLE: &str = "CHECK_BLOCKS_LOG";

pub fn initialize_logger(module_path: &str, always_write_style: bool) -> Result<()> {
    let mut builder = Builder::new();

    builder
        .filter_level(LevelFilter::Off)
        .filter_module("archive_checker", LevelFilter::Info)
        .filter_module("block_store", LevelFilter::Info)
        .filter_module("fork_db", LevelFilter::Info)
        .filter_module(module_path, LevelFilter::Info)
        .filter_module(module_path!(), LevelFilter::Info)
        .format(|formatter, record| {
            let level_style = formatter.default_level_style(record.level());

            writeln!(
                formatter,
                "[{}] {level_style}{:<5}{level_style:#} {}: {}",
                Local::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                record.level(),
                record.target(),
                record.args(),
            )
        })
        .parse_env(Env::new().filter(LOG_ENV_VARIABLE));

    if always_write_style {
        builder.write_style(WriteStyle::Always);
    }

    builder.try_init()?;

    Ok(())
}
