use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

pub fn max_level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Installs the global subscriber once; later calls and embedders that
/// already set one are left alone.
pub fn init_logging(verbose: bool) {
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_max_level(max_level(verbose))
                .with_target(false)
                .init();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init_logging(true);
        init_logging(false);
        assert!(tracing::dispatcher::has_been_set());
        assert_eq!(max_level(false), Level::INFO);
    }
}
