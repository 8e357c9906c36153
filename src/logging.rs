//! Logger setup for the hatch binary
//!
//! Logs go to stderr; stdout is reserved for file content. `RUST_LOG`
//! overrides the level picked from the verbosity flag.

use env_logger::Env;

/// Default filter for a `-v` count
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global logger. Calling it twice is harmless.
pub fn init(verbosity: u8) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter(verbosity)))
        .format_timestamp_millis()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(0), "warn");
        assert_eq!(default_filter(1), "info");
        assert_eq!(default_filter(2), "debug");
        assert_eq!(default_filter(9), "trace");
    }

    #[test]
    fn test_init_twice() {
        init(0);
        init(2);
    }
}
