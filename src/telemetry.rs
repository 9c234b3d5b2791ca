use tracing_subscriber::EnvFilter;

use crate::error::DiscoveryError;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins over `default_directive`. Calling this again after a
/// subscriber is installed is a no-op.
pub fn init_tracing(default_directive: &str) -> Result<(), DiscoveryError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive)
            .map_err(|e| DiscoveryError::Config(format!("invalid log directive: {e}")))?,
    };

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::trace!("Tracing subscriber already installed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        assert!(init_tracing("vitrina=debug").is_ok());
        assert!(init_tracing("vitrina=debug").is_ok());
    }
}
