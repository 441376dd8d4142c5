use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tailscope_types::Entry;

use crate::tail::TailCursor;

/// Events produced while following a file
#[derive(Clone, Debug)]
pub enum TailEvent {
    /// Records completed since the previous poll
    Entries(Vec<Entry>),
    /// The file could not be read; polling continues
    Unavailable(String),
    /// The file is readable again after an outage
    Recovered,
}

/// Polls a [`TailCursor`] on a fixed interval in a background task
pub struct TailFollower {
    /// Cancellation token for stopping the poll loop
    cancel: CancellationToken,

    /// Active poll task
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TailFollower {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    /// Start following, replacing any previous poll loop
    ///
    /// The cursor moves into the task and is dropped (closing the file)
    /// when the loop ends.
    pub fn start(
        &mut self,
        cursor: TailCursor,
        interval: Duration,
        event_tx: mpsc::UnboundedSender<TailEvent>,
    ) {
        self.stop();
        let cancel = self.cancel.clone();
        self.task = Some(tokio::spawn(follow(cursor, interval, cancel, event_tx)));
    }

    /// Stop following
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        // Create a fresh cancellation token for the next session
        self.cancel = CancellationToken::new();
    }

    /// Check if the poll loop is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Default for TailFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TailFollower {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Poll `cursor` every `interval` until cancelled or the receiver is gone
///
/// Each poll runs on the blocking pool. Cancellation is only observed
/// between polls, never during a read.
pub async fn follow(
    mut cursor: TailCursor,
    interval: Duration,
    cancel: CancellationToken,
    event_tx: mpsc::UnboundedSender<TailEvent>,
) {
    let path = cursor.path().display().to_string();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut unavailable = false;

    info!(%path, ?interval, "following log file");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let polled = tokio::task::spawn_blocking(move || {
            let result = cursor.poll();
            (cursor, result)
        })
        .await;
        let result = match polled {
            Ok((returned, result)) => {
                cursor = returned;
                result
            }
            Err(err) => {
                warn!(error = %err, "poll task failed, stopping");
                break;
            }
        };

        let event = match result {
            Ok(entries) => {
                let recovered = std::mem::take(&mut unavailable);
                if recovered && event_tx.send(TailEvent::Recovered).is_err() {
                    break;
                }
                if entries.is_empty() {
                    continue;
                }
                TailEvent::Entries(entries)
            }
            Err(err) => {
                if unavailable {
                    debug!(error = %err, "log file still unavailable");
                    continue;
                }
                warn!(path = %err.path().display(), error = %err, "log file unavailable, will keep polling");
                unavailable = true;
                TailEvent::Unavailable(err.to_string())
            }
        };

        if event_tx.send(event).is_err() {
            // Receiver closed, stop following
            break;
        }
    }

    info!(%path, "stopped following log file");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, OpenOptions};
    use std::io::Write;

    const INTERVAL: Duration = Duration::from_millis(10);

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<TailEvent>) -> TailEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for tail event")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_follower_delivers_appended_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "2026-02-06 09:59:59, INFO before\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut follower = TailFollower::new();
        follower.start(TailCursor::open_for_tail(&path).unwrap(), INTERVAL, tx);

        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(f, "2026-02-06 10:00:00, ERROR disk failure").unwrap();

        match next_event(&mut rx).await {
            TailEvent::Entries(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].message(), "disk failure");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        follower.stop();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_record_split_across_polls_keeps_cursor_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut follower = TailFollower::new();
        follower.start(TailCursor::open_for_tail(&path).unwrap(), INTERVAL, tx);

        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        write!(f, "2026-02-06 10:00:00, WARN low").unwrap();
        f.flush().unwrap();
        // Several polls run on the blocking pool before the line is finished
        tokio::time::sleep(INTERVAL * 5).await;
        writeln!(f, " memory").unwrap();

        match next_event(&mut rx).await {
            TailEvent::Entries(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].severity(), "WARN");
                assert_eq!(entries[0].message(), "low memory");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        follower.stop();
    }

    #[tokio::test]
    async fn test_follower_reports_outage_once_and_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut follower = TailFollower::new();
        follower.start(TailCursor::open_for_tail(&path).unwrap(), INTERVAL, tx);

        fs::remove_file(&path).unwrap();
        assert!(matches!(next_event(&mut rx).await, TailEvent::Unavailable(_)));

        fs::write(&path, "2026-02-06 10:00:00, INFO back\n").unwrap();
        assert!(matches!(next_event(&mut rx).await, TailEvent::Recovered));
        match next_event(&mut rx).await {
            TailEvent::Entries(entries) => assert_eq!(entries[0].message(), "back"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_ends_loop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(follow(
            TailCursor::open_for_tail(&path).unwrap(),
            INTERVAL,
            cancel.clone(),
            tx,
        ));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        // Sender was dropped with the loop
        assert!(rx.recv().await.is_none());
    }
}
