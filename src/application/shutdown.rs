//! Cooperative cancellation shared by the use cases

use tokio::sync::watch;

/// Resolve once the flag turns `true`.
///
/// A dropped sender means nobody can ever cancel, so this then pends forever
/// instead of reporting a spurious cancellation.
pub async fn cancelled(flag: &mut watch::Receiver<bool>) {
    if flag.wait_for(|set| *set).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn resolves_when_set() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();
        timeout(Duration::from_secs(1), cancelled(&mut rx))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_sender_never_cancels() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        assert!(timeout(Duration::from_millis(50), cancelled(&mut rx))
            .await
            .is_err());
    }
}
