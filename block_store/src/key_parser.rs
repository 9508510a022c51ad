use std::sync::LazyLock;

use regex::Regex;

static FIXED_WIDTH_DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{10})").expect("fixed-width decimal key pattern should be valid")
});

/// Extracts the base block number of a bundle from its store key.
pub trait KeyParser {
    /// Returns `None` for keys that do not name a bundle.
    fn base_number(&self, key: &str) -> Option<u64>;
}

/// Parses the first match of a regular expression as a decimal base number.
///
/// The first capture group is used if the pattern has one, otherwise the whole match.
/// The default pattern accepts keys like `0000012300.dbin.zst`.
#[derive(Clone, Debug)]
pub struct RegexKeyParser {
    regex: Regex,
}

impl Default for RegexKeyParser {
    fn default() -> Self {
        Self {
            regex: FIXED_WIDTH_DECIMAL.clone(),
        }
    }
}

impl RegexKeyParser {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(|regex| Self { regex })
    }
}

impl KeyParser for RegexKeyParser {
    fn base_number(&self, key: &str) -> Option<u64> {
        let captures = self.regex.captures(key)?;
        let number = captures.get(1).or_else(|| captures.get(0))?;

        number.as_str().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("0000000100" => Some(100))]
    #[test_case("0000012300.dbin.zst" => Some(12_300))]
    #[test_case("merged/0004000000.dbin" => Some(4_000_000))]
    #[test_case("123.dbin" => None; "too few digits")]
    #[test_case("README" => None)]
    fn default_parser_reads_ten_digit_base(key: &str) -> Option<u64> {
        RegexKeyParser::default().base_number(key)
    }

    #[test]
    fn custom_pattern_without_group_uses_whole_match() -> Result<(), regex::Error> {
        let parser = RegexKeyParser::new(r"\d+")?;

        assert_eq!(parser.base_number("blocks-42.bin"), Some(42));

        Ok(())
    }

    #[test]
    fn custom_pattern_uses_first_group() -> Result<(), regex::Error> {
        let parser = RegexKeyParser::new(r"^bundle-(\d+)-v\d+$")?;

        assert_eq!(parser.base_number("bundle-700-v2"), Some(700));
        assert_eq!(parser.base_number("other-700-v2"), None);

        Ok(())
    }
}
