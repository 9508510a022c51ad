use std::env::consts::{ARCH, OS};

use const_format::concatcp;

pub const APPLICATION_NAME: &str = "check_blocks";
pub const APPLICATION_VERSION: &str = env!("CARGO_PKG_VERSION");

// Parts of a client version are conventionally separated with slashes.
pub const APPLICATION_VERSION_WITH_PLATFORM: &str =
    concatcp!(APPLICATION_NAME, "/", APPLICATION_VERSION, "/", ARCH, "-", OS);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_with_platform_has_three_parts() {
        let parts = APPLICATION_VERSION_WITH_PLATFORM.split('/').collect::<Vec<_>>();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], APPLICATION_NAME);
        assert_eq!(parts[1], APPLICATION_VERSION);
    }
}
