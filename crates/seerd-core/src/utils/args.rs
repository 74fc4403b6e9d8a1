//! Argument-string splitting.
//!
//! Configuration supplies arguments as one string. It is split with POSIX
//! shell quoting rules (no variable expansion, no globbing).

pub use shell_words::ParseError;

/// Split an argument string into individual arguments.
///
/// An empty or whitespace-only string yields no arguments.
pub fn split_arguments(arguments: &str) -> Result<Vec<String>, ParseError> {
    shell_words::split(arguments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string_has_no_arguments() {
        assert!(split_arguments("").unwrap().is_empty());
        assert!(split_arguments("   ").unwrap().is_empty());
    }

    #[test]
    fn test_quoted_arguments() {
        let args = split_arguments(r#"-c 'echo hi' --name "a b""#).unwrap();
        assert_eq!(args, vec!["-c", "echo hi", "--name", "a b"]);
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        assert!(split_arguments("'oops").is_err());
    }
}
