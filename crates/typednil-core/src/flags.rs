//! Flag string forwarded by the hosting shim.
//!
//! The analyzer defines no flags of its own, so the only valid flag
//! string is an empty one. Anything else aborts before analysis.

use clap::Parser;

use crate::config::ConfigError;

#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "typednil",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct AnalyzerFlags {}

/// Parse a whitespace-separated flag string.
pub fn parse_flag_string(raw: &str) -> Result<AnalyzerFlags, ConfigError> {
    let args: Vec<&str> = raw.split_whitespace().collect();
    if args.is_empty() {
        return Ok(AnalyzerFlags::default());
    }
    Ok(AnalyzerFlags::try_parse_from(args)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_flags_accepted() {
        assert!(parse_flag_string("").is_ok());
        assert!(parse_flag_string("   ").is_ok());
    }

    #[test]
    fn test_any_flag_rejected() {
        for raw in ["-strict", "--verbose", "extra", "--help"] {
            let err = parse_flag_string(raw).unwrap_err();
            assert!(matches!(err, ConfigError::Flags(_)), "{raw} should fail");
        }
    }
}
