//! OS signal handling for graceful shutdown

use solo_core::prelude::*;

/// Wait for SIGINT or SIGTERM
pub async fn wait_for_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| Error::startup(format!("Failed to create SIGINT handler: {}", e)))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| Error::startup(format!("Failed to create SIGTERM handler: {}", e)))?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("Received SIGINT");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_for_signal_stays_pending() {
        let waiting = tokio::spawn(wait_for_signal());

        // Give it a moment to install handlers
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!waiting.is_finished());
        waiting.abort();
    }
}
