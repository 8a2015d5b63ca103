//! Logging setup for the binary.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "docqa_rag=debug,docqa_cli=debug,info" } else { "warn" }
}

/// Install a formatted subscriber writing to stderr, so stdout stays for answers.
///
/// `RUST_LOG` wins over `--verbose` when set. Calling this twice is harmless.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_enables_debug_for_docqa() {
        assert!(default_directive(true).contains("docqa_rag=debug"));
        assert_eq!(default_directive(false), "warn");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(false);
        init(true);
    }
}
