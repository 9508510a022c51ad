use core::num::NonZeroU64;

use archive_checker::{CheckConfig, PrintDetails};
use block_range::BlockRange;
use checker_version::{APPLICATION_NAME, APPLICATION_VERSION};
use clap::Parser;

/// Checks a merged blocks archive for missing bundles, fork breakage and incomplete coverage
#[derive(Parser)]
#[clap(display_name = APPLICATION_NAME, verbatim_doc_comment, version = APPLICATION_VERSION)]
pub struct CheckBlocksArgs {
    /// Location of the merged blocks store (local directory or file:// URL)
    #[clap(value_name = "STORE_URL")]
    store_url: String,

    /// Blocks to check (start:stop, start:, :stop or start)
    /// Open ranges are checked until the end of the archive
    #[clap(value_name = "RANGE")]
    block_range: BlockRange,

    /// Number of blocks in every bundle
    #[clap(long, default_value_t = CheckConfig::DEFAULT_BUNDLE_SIZE)]
    bundle_size: NonZeroU64,

    /// Decode blocks and print stats for each of them (stats) or the whole block (full)
    #[clap(long, value_name = "DETAILS", default_value_t = PrintDetails::NoDetails)]
    print_details: PrintDetails,

    /// First block number the chain is able to stream
    #[clap(long, value_name = "BLOCK", default_value_t = 0)]
    first_streamable_block: u64,

    /// Always write colored log output, even when not writing to a terminal
    #[clap(long)]
    always_write_style: bool,
}

pub struct CheckBlocksConfig {
    pub store_url: String,
    pub check_config: CheckConfig,
    pub always_write_style: bool,
}

impl CheckBlocksArgs {
    #[must_use]
    pub fn into_config(self) -> CheckBlocksConfig {
        let Self {
            store_url,
            block_range,
            bundle_size,
            print_details,
            first_streamable_block,
            always_write_style,
        } = self;

        // An open range on the command line means "until the end of the archive".
        let check_config = CheckConfig::new(block_range.resolve_unbounded())
            .with_bundle_size(bundle_size)
            .with_print_details(print_details)
            .with_first_streamable_block(first_streamable_block);

        CheckBlocksConfig {
            store_url,
            check_config,
            always_write_style,
        }
    }
}
