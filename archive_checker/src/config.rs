use core::num::NonZeroU64;

use block_range::BlockRange;
use nonzero_ext::nonzero;
use strum::{AsRefStr, Display, EnumString};

/// How much of every block is looked at.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PrintDetails {
    /// Only list bundle keys. Bundles are assumed to be full.
    #[default]
    #[strum(serialize = "none")]
    NoDetails,
    /// Decode every block and pass it to a [`BlockObserver`](crate::BlockObserver).
    Stats,
    /// Decode every block and print it as JSON.
    Full,
}

impl PrintDetails {
    #[must_use]
    pub const fn reads_blocks(self) -> bool {
        !matches!(self, Self::NoDetails)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CheckConfig {
    pub bundle_size: NonZeroU64,
    pub block_range: BlockRange,
    pub print_details: PrintDetails,
    /// Blocks below this number were never produced, so bundles holding them are not short.
    pub first_streamable_block: u64,
}

impl CheckConfig {
    pub const DEFAULT_BUNDLE_SIZE: NonZeroU64 = nonzero!(100_u64);

    #[must_use]
    pub const fn new(block_range: BlockRange) -> Self {
        Self {
            bundle_size: Self::DEFAULT_BUNDLE_SIZE,
            block_range,
            print_details: PrintDetails::NoDetails,
            first_streamable_block: 0,
        }
    }

    #[must_use]
    pub const fn with_print_details(mut self, print_details: PrintDetails) -> Self {
        self.print_details = print_details;
        self
    }

    #[must_use]
    pub const fn with_bundle_size(mut self, bundle_size: NonZeroU64) -> Self {
        self.bundle_size = bundle_size;
        self
    }

    #[must_use]
    pub const fn with_first_streamable_block(mut self, first_streamable_block: u64) -> Self {
        self.first_streamable_block = first_streamable_block;
        self
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("none" => Ok(PrintDetails::NoDetails))]
    #[test_case("stats" => Ok(PrintDetails::Stats))]
    #[test_case("FULL" => Ok(PrintDetails::Full); "case insensitive")]
    #[test_case("everything" => Err(strum::ParseError::VariantNotFound))]
    fn print_details_parses_from_cli_names(input: &str) -> Result<PrintDetails, strum::ParseError> {
        input.parse()
    }

    #[test]
    fn print_details_displays_cli_names() {
        assert_eq!(PrintDetails::NoDetails.to_string(), "none");
        assert_eq!(PrintDetails::Stats.as_ref(), "stats");
    }
}
