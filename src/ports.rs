use crate::error::ConfigError;

/// Parse a port argument as a signed decimal integer.
///
/// Surrounding whitespace is ignored. Bounds are not checked here; pass the
/// value on to [`crate::types::ScanRange::new`] which owns the range rules.
pub fn parse_port_arg(which: &'static str, s: &str) -> Result<i64, ConfigError> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::MalformedPort {
            which,
            value: s.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_numbers() {
        assert_eq!(parse_port_arg("start", "80").unwrap(), 80);
        assert_eq!(parse_port_arg("end", "  443 ").unwrap(), 443);
    }

    #[test]
    fn out_of_range_values_still_parse() {
        assert_eq!(parse_port_arg("start", "0").unwrap(), 0);
        assert_eq!(parse_port_arg("end", "70000").unwrap(), 70000);
        assert_eq!(parse_port_arg("start", "-5").unwrap(), -5);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let err = parse_port_arg("start", "80x").unwrap_err();
        assert_eq!(
            err,
            ConfigError::MalformedPort {
                which: "start",
                value: "80x".into()
            }
        );
        assert_eq!(err.to_string(), "invalid start port: 80x");
    }
}
