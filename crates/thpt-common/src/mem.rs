//! Memory-limit string parsing
//!
//! Operator-facing memory ceilings arrive as shorthand strings such as
//! `"256M"`, `"1G"` or `"524288"` (bare bytes). Suffixes are
//! case-insensitive single letters: K, M, G.

use crate::error::{Result, ThptError};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * 1024 * 1024;

/// Parse a memory-limit string into whole megabytes.
///
/// A bare number is interpreted as bytes. Fractional megabyte remainders
/// round down; anything below 1 MB parses to 0.
pub fn parse_memory_limit_mb(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ThptError::parse("Memory limit is empty".to_string()));
    }

    let (digits, multiplier) = match trimmed.chars().last() {
        Some(c) if c.eq_ignore_ascii_case(&'k') => (&trimmed[..trimmed.len() - 1], KIB),
        Some(c) if c.eq_ignore_ascii_case(&'m') => (&trimmed[..trimmed.len() - 1], MIB),
        Some(c) if c.eq_ignore_ascii_case(&'g') => (&trimmed[..trimmed.len() - 1], GIB),
        _ => (trimmed, 1),
    };

    let value: u64 = digits.trim().parse().map_err(|_| {
        ThptError::parse(format!("Invalid memory limit: '{}'", input))
    })?;

    Ok(value.saturating_mul(multiplier) / MIB)
}

/// Format a byte count as megabytes with two decimal places
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / MIB as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(parse_memory_limit_mb("256M").unwrap(), 256);
        assert_eq!(parse_memory_limit_mb("1G").unwrap(), 1024);
        assert_eq!(parse_memory_limit_mb("2g").unwrap(), 2048);
        assert_eq!(parse_memory_limit_mb("512m").unwrap(), 512);
        assert_eq!(parse_memory_limit_mb("2048K").unwrap(), 2);
        assert_eq!(parse_memory_limit_mb("131072k").unwrap(), 128);
    }

    #[test]
    fn test_parse_bare_bytes() {
        assert_eq!(parse_memory_limit_mb("134217728").unwrap(), 128);
        assert_eq!(parse_memory_limit_mb("1048576").unwrap(), 1);
        // Below one megabyte rounds down to zero
        assert_eq!(parse_memory_limit_mb("1024").unwrap(), 0);
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(parse_memory_limit_mb(" 256M ").unwrap(), 256);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_memory_limit_mb("").is_err());
        assert!(parse_memory_limit_mb("abc").is_err());
        assert!(parse_memory_limit_mb("12T").is_err());
        assert!(parse_memory_limit_mb("-1G").is_err());
    }

    #[test]
    fn test_format_mb() {
        assert_eq!(format_mb(0), "0.00");
        assert_eq!(format_mb(1048576), "1.00");
        assert_eq!(format_mb(1572864), "1.50");
    }
}
