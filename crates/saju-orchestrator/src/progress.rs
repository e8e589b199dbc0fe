//! Two-phase progress pattern for long analyses.
//!
//! The analysis races a 3-second timer. If it wins, the reply goes straight
//! out. Otherwise an interim message is posted (generated by a second, small
//! LLM call that was started in parallel) and edited every 2 seconds through
//! the fixed stage sequence until the analysis lands; the progress message is
//! then deleted. Edit failures are swallowed — the progress UX is best-effort.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use saju_core::error::SajuError;

use crate::replies::PROGRESS_STAGES;
use crate::responder::Responder;

const FAST_PATH: Duration = Duration::from_secs(3);
const EDIT_INTERVAL: Duration = Duration::from_secs(2);

/// Drive `analysis` to completion, showing progress when it runs long.
///
/// `interim` resolves to the first progress text (the small LLM call);
/// falling back to the first stage label when it fails or is slow.
pub async fn run_with_progress<T, A, I>(
    responder: Arc<dyn Responder>,
    interim: I,
    analysis: A,
) -> Result<T, SajuError>
where
    A: Future<Output = Result<T, SajuError>>,
    I: Future<Output = Option<String>> + Send + 'static,
{
    if !responder.supports_progress() {
        return analysis.await;
    }

    tokio::pin!(analysis);

    // Fast path: the analysis may beat the timer.
    let slow = tokio::select! {
        result = &mut analysis => return result,
        _ = tokio::time::sleep(FAST_PATH) => true,
    };
    debug!(slow, "analysis exceeded fast path — posting progress message");

    // The interim generator had a 3s head start; give it a short grace.
    let interim_text = tokio::time::timeout(Duration::from_millis(300), interim)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| PROGRESS_STAGES[0].to_string());

    let progress_msg = responder.send_text(&interim_text, &[]).await.ok();

    let cancel = CancellationToken::new();
    let editor = progress_msg.clone().map(|msg| {
        let responder = Arc::clone(&responder);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut stage = 0usize;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(EDIT_INTERVAL) => {}
                }
                if stage >= PROGRESS_STAGES.len() {
                    // Hold on the final label; nothing left to show.
                    continue;
                }
                // Best-effort edit.
                let _ = responder.edit_text(&msg, PROGRESS_STAGES[stage]).await;
                stage += 1;
            }
        })
    });

    let result = analysis.await;

    cancel.cancel();
    if let Some(handle) = editor {
        let _ = handle.await;
    }
    if let Some(msg) = progress_msg {
        let _ = responder.delete(&msg).await;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use saju_core::types::UiAction;
    use std::sync::Mutex;

    use crate::responder::MessageRef;

    #[derive(Default)]
    struct RecordingResponder {
        pub sent: Mutex<Vec<String>>,
        pub edits: Mutex<Vec<String>>,
        pub deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Responder for RecordingResponder {
        async fn send_text(
            &self,
            text: &str,
            _actions: &[UiAction],
        ) -> Result<MessageRef, SajuError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(text.to_string());
            Ok(MessageRef(format!("m{}", sent.len())))
        }

        async fn edit_text(&self, _msg: &MessageRef, text: &str) -> Result<(), SajuError> {
            self.edits.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn delete(&self, msg: &MessageRef) -> Result<(), SajuError> {
            self.deleted.lock().unwrap().push(msg.0.clone());
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fast_analysis_skips_progress() {
        let responder = Arc::new(RecordingResponder::default());
        let result = run_with_progress(
            responder.clone() as Arc<dyn Responder>,
            async { Some("interim".to_string()) },
            async { Ok::<_, SajuError>(42) },
        )
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert!(responder.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_analysis_posts_edits_and_deletes() {
        let responder = Arc::new(RecordingResponder::default());
        let result = run_with_progress(
            responder.clone() as Arc<dyn Responder>,
            async { Some("잠시만요, 명식을 보는 중이에요".to_string()) },
            async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, SajuError>("done")
            },
        )
        .await
        .unwrap();
        assert_eq!(result, "done");

        let sent = responder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("명식"));

        let edits = responder.edits.lock().unwrap();
        assert!(!edits.is_empty(), "expected at least one progress edit");
        assert_eq!(edits[0], PROGRESS_STAGES[0]);

        assert_eq!(responder.deleted.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn error_still_cleans_up_progress_message() {
        let responder = Arc::new(RecordingResponder::default());
        let result: Result<i32, _> = run_with_progress(
            responder.clone() as Arc<dyn Responder>,
            async { None },
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Err(SajuError::Internal("boom".into()))
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(responder.deleted.lock().unwrap().len(), 1);
        // Interim generator returned None — first stage label used instead.
        assert_eq!(responder.sent.lock().unwrap()[0], PROGRESS_STAGES[0]);
    }
}
