use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    num::{NonZeroU64, ParseIntError},
    str::FromStr,
};

use thiserror::Error;

/// Number of decimal digits used to encode bundle base numbers in store keys.
pub const KEY_WIDTH: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRangeError {
    #[error("block range stop {stop} must be greater than its start {start}")]
    StopNotAfterStart { start: u64, stop: u64 },
    #[error("check merged blocks can only work with fully resolved range, got {range}")]
    Unresolved { range: BlockRange },
    #[error("block range {input:?} contains an invalid block number")]
    InvalidNumber {
        input: String,
        #[source]
        source: ParseIntError,
    },
}

/// A range of block numbers with an inclusive start and an optional exclusive stop.
///
/// A range without a stop is open. Open ranges are not resolved unless they were explicitly
/// marked as runnable to the end of the archive with [`BlockRange::resolve_unbounded`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BlockRange {
    start: u64,
    stop: Option<u64>,
    unbounded: bool,
}

impl Display for BlockRange {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        match self.stop {
            Some(stop) => write!(
                formatter,
                "[{}, {})",
                pretty_block_num(self.start),
                pretty_block_num(stop),
            ),
            None => write!(formatter, "[{}, +inf)", pretty_block_num(self.start)),
        }
    }
}

impl FromStr for BlockRange {
    type Err = InvalidRangeError;

    /// Accepts `start:stop`, `start:`, `:stop` and `start`.
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let parse_number = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|source| InvalidRangeError::InvalidNumber {
                    input: string.to_owned(),
                    source,
                })
        };

        let Some((start, stop)) = string.split_once(':') else {
            return Ok(Self::open(parse_number(string)?));
        };

        let start = if start.trim().is_empty() {
            0
        } else {
            parse_number(start)?
        };

        if stop.trim().is_empty() {
            return Ok(Self::open(start));
        }

        Self::closed(start, parse_number(stop)?)
    }
}

impl BlockRange {
    pub fn closed(start: u64, stop: u64) -> Result<Self, InvalidRangeError> {
        if stop <= start {
            return Err(InvalidRangeError::StopNotAfterStart { start, stop });
        }

        Ok(Self {
            start,
            stop: Some(stop),
            unbounded: false,
        })
    }

    #[must_use]
    pub const fn open(start: u64) -> Self {
        Self {
            start,
            stop: None,
            unbounded: false,
        }
    }

    /// Marks an open range as runnable until the end of the archive.
    /// Closed ranges are returned unchanged.
    #[must_use]
    pub const fn resolve_unbounded(self) -> Self {
        Self {
            unbounded: self.stop.is_none(),
            ..self
        }
    }

    #[must_use]
    pub const fn start(self) -> u64 {
        self.start
    }

    #[must_use]
    pub const fn stop(self) -> Option<u64> {
        self.stop
    }

    /// The last block number included in a closed range.
    #[must_use]
    pub const fn last_block(self) -> Option<u64> {
        match self.stop {
            Some(stop) => Some(stop - 1),
            None => None,
        }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        self.stop.is_none()
    }

    #[must_use]
    pub const fn is_closed(self) -> bool {
        self.stop.is_some()
    }

    #[must_use]
    pub const fn is_resolved(self) -> bool {
        self.is_closed() || self.unbounded
    }

    pub fn ensure_resolved(self) -> Result<Self, InvalidRangeError> {
        if self.is_resolved() {
            Ok(self)
        } else {
            Err(InvalidRangeError::Unresolved { range: self })
        }
    }

    #[must_use]
    pub const fn contains(self, number: u64) -> bool {
        match self.stop {
            Some(stop) => self.start <= number && number < stop,
            None => self.start <= number,
        }
    }
}

/// An inclusive span of block numbers, used when reporting what was found in an archive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BlockSpan {
    pub first: u64,
    pub last: u64,
}

impl Display for BlockSpan {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        write!(
            formatter,
            "[{}, {}]",
            pretty_block_num(self.first),
            pretty_block_num(self.last),
        )
    }
}

impl BlockSpan {
    #[must_use]
    pub const fn new(first: u64, last: u64) -> Self {
        Self { first, last }
    }

    /// Renders the span as `first:last+1`, the syntax reprocessing tools accept.
    #[must_use]
    pub fn reproc_range(self) -> String {
        format!("{}:{}", self.first, self.last + 1)
    }
}

#[must_use]
pub const fn round_to_bundle_start(number: u64, bundle_size: NonZeroU64) -> u64 {
    number - number % bundle_size.get()
}

#[must_use]
pub const fn round_to_bundle_end(number: u64, bundle_size: NonZeroU64) -> u64 {
    round_to_bundle_start(number, bundle_size) + bundle_size.get() - 1
}

/// Zero-pads a bundle base number the same way store keys are encoded.
#[must_use]
pub fn bundle_key(base_number: u64) -> String {
    format!("{base_number:0width$}", width = KEY_WIDTH)
}

/// Computes the shortest key prefix that still lists every bundle of `range`.
///
/// Open ranges need the whole store to be listed and get an empty prefix.
#[must_use]
pub fn walk_prefix(range: BlockRange, bundle_size: NonZeroU64) -> String {
    let Some(last_block) = range.last_block() else {
        return String::new();
    };

    let mut start = bundle_key(round_to_bundle_start(range.start(), bundle_size));
    let end = bundle_key(round_to_bundle_end(last_block, bundle_size) + 1);

    let common_length = start
        .bytes()
        .zip(end.bytes())
        .take_while(|(start_digit, end_digit)| start_digit == end_digit)
        .count();

    // Keys are ASCII digits, so any byte offset is a character boundary.
    start.truncate(common_length);
    start
}

/// Formats a block number as `#1 234 567`.
#[must_use]
pub fn pretty_block_num(number: u64) -> String {
    let digits = number.to_string();
    let mut pretty = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    pretty.push('#');

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            pretty.push(' ');
        }

        pretty.push(digit);
    }

    pretty
}

#[cfg(test)]
mod tests {
    use nonzero_ext::nonzero;
    use test_case::test_case;

    use super::*;

    const BUNDLE_SIZE: NonZeroU64 = nonzero!(100_u64);

    #[test_case(250 => 200)]
    #[test_case(200 => 200)]
    #[test_case(0 => 0)]
    #[test_case(99 => 0)]
    fn round_to_bundle_start_rounds_down(number: u64) -> u64 {
        round_to_bundle_start(number, BUNDLE_SIZE)
    }

    #[test_case(250 => 299)]
    #[test_case(200 => 299)]
    #[test_case(0 => 99)]
    fn round_to_bundle_end_rounds_up(number: u64) -> u64 {
        round_to_bundle_end(number, BUNDLE_SIZE)
    }

    #[test_case(1000, 2000 => "000000"; "bounds differ at the thousands digit")]
    #[test_case(100, 200 => "0000000"; "bounds differ at the hundreds digit")]
    #[test_case(0, 100 => "0000000"; "single bundle at genesis")]
    #[test_case(150, 250 => "0000000"; "unaligned bounds are rounded to bundles")]
    #[test_case(12_345_600, 12_345_700 => "0012345"; "single bundle deep in the chain")]
    #[test_case(0, 1_000_000_000 => ""; "bounds differ at the first digit")]
    fn walk_prefix_is_longest_common_prefix(start: u64, stop: u64) -> String {
        let range = BlockRange::closed(start, stop).expect("test ranges are valid");
        walk_prefix(range, BUNDLE_SIZE)
    }

    #[test]
    fn walk_prefix_of_open_range_is_empty() {
        let range = BlockRange::open(1000).resolve_unbounded();
        assert_eq!(walk_prefix(range, BUNDLE_SIZE), "");
    }

    #[test]
    fn bundle_key_is_zero_padded() {
        assert_eq!(bundle_key(1), "0000000001");
        assert_eq!(bundle_key(12_345_600), "0012345600");
    }

    #[test_case("100:200" => Ok(BlockRange::closed(100, 200).expect("valid")))]
    #[test_case(":200" => Ok(BlockRange::closed(0, 200).expect("valid")))]
    #[test_case("100:" => Ok(BlockRange::open(100)))]
    #[test_case("100" => Ok(BlockRange::open(100)))]
    #[test_case(" 5 : 7 " => Ok(BlockRange::closed(5, 7).expect("valid")))]
    #[test_case("200:100" => Err(InvalidRangeError::StopNotAfterStart { start: 200, stop: 100 }))]
    #[test_case("100:100" => Err(InvalidRangeError::StopNotAfterStart { start: 100, stop: 100 }))]
    fn block_range_from_str(string: &str) -> Result<BlockRange, InvalidRangeError> {
        string.parse()
    }

    #[test]
    fn block_range_from_str_rejects_garbage() {
        assert!(matches!(
            "abc:200".parse::<BlockRange>(),
            Err(InvalidRangeError::InvalidNumber { .. }),
        ));
    }

    #[test]
    fn open_range_is_resolved_only_when_marked_unbounded() {
        let open = BlockRange::open(10);

        assert!(open.is_open());
        assert!(!open.is_closed());
        assert!(!open.is_resolved());
        assert_eq!(
            open.ensure_resolved(),
            Err(InvalidRangeError::Unresolved { range: open }),
        );

        let unbounded = open.resolve_unbounded();

        assert!(unbounded.is_open());
        assert!(unbounded.is_resolved());
        assert_eq!(unbounded.ensure_resolved(), Ok(unbounded));
    }

    #[test]
    fn closed_range_is_resolved() -> Result<(), InvalidRangeError> {
        let range = BlockRange::closed(0, 300)?;

        assert!(range.is_closed());
        assert!(range.is_resolved());
        assert_eq!(range.last_block(), Some(299));
        assert!(range.contains(299));
        assert!(!range.contains(300));

        Ok(())
    }

    #[test_case(0 => "#0")]
    #[test_case(999 => "#999")]
    #[test_case(1000 => "#1 000")]
    #[test_case(1_234_567 => "#1 234 567")]
    fn pretty_block_num_groups_thousands(number: u64) -> String {
        pretty_block_num(number)
    }

    #[test]
    fn block_span_renders_reproc_range() {
        let span = BlockSpan::new(200, 299);

        assert_eq!(span.to_string(), "[#200, #299]");
        assert_eq!(span.reproc_range(), "200:300");
    }
}
