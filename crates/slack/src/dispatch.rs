use std::sync::Arc;

use tracing::{debug, warn};

use crate::web_api::SlackApi;

/// Longest chunk, in characters, posted as one Slack message.
pub const MESSAGE_CHUNK_SIZE: usize = 3500;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// Splits `text` into contiguous pieces of at most `chunk_size` characters.
///
/// Splits fall on `char` boundaries, so multi-byte text is never cut inside a
/// character. Concatenating the chunks yields `text` again; empty input yields
/// no chunks.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut start = 0;
    let mut count = 0;

    for (index, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(&text[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

pub struct MessageDispatcher {
    api: Arc<dyn SlackApi>,
    chunk_size: usize,
}

impl MessageDispatcher {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self::with_chunk_size(api, MESSAGE_CHUNK_SIZE)
    }

    pub fn with_chunk_size(api: Arc<dyn SlackApi>, chunk_size: usize) -> Self {
        Self { api, chunk_size: chunk_size.max(1) }
    }

    /// Posts every chunk in order, one attempt each. A failed chunk is logged
    /// and the remaining chunks are still sent.
    pub async fn send_long_message(&self, channel_id: &str, text: &str) -> DispatchReport {
        let chunks = chunk_text(text, self.chunk_size);
        let total = chunks.len();
        let mut report = DispatchReport::default();

        for (index, chunk) in chunks.into_iter().enumerate() {
            match self.api.post_message(channel_id, chunk).await {
                Ok(()) => {
                    report.sent += 1;
                    debug!(
                        event_name = "slack.dispatch.chunk_sent",
                        channel_id,
                        chunk = index + 1,
                        total,
                        "posted message chunk"
                    );
                }
                Err(error) => {
                    report.failed += 1;
                    warn!(
                        event_name = "slack.dispatch.chunk_failed",
                        channel_id,
                        chunk = index + 1,
                        total,
                        error = %error,
                        "failed to post message chunk; continuing"
                    );
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{chunk_text, DispatchReport, MessageDispatcher, MESSAGE_CHUNK_SIZE};
    use crate::web_api::{SlackApi, SlackApiError};

    #[derive(Default)]
    struct RecordingApi {
        posts: Mutex<Vec<(String, String)>>,
        failing_post_indexes: Vec<usize>,
    }

    #[async_trait]
    impl SlackApi for RecordingApi {
        async fn user_email(&self, _user_id: &str) -> Result<Option<String>, SlackApiError> {
            Ok(None)
        }

        async fn recent_messages(
            &self,
            _channel_id: &str,
            _limit: u32,
        ) -> Result<Vec<String>, SlackApiError> {
            Ok(Vec::new())
        }

        async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackApiError> {
            let mut posts = self.posts.lock().expect("lock");
            let index = posts.len();
            posts.push((channel_id.to_owned(), text.to_owned()));
            if self.failing_post_indexes.contains(&index) {
                return Err(SlackApiError::Api {
                    method: "chat.postMessage",
                    error: "msg_too_long".to_owned(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn chunk_count_and_sizes_follow_ceiling_division() {
        for length in [1, 3499, 3500, 3501, 7000, 10_123] {
            let text = "가".repeat(length);
            let chunks = chunk_text(&text, MESSAGE_CHUNK_SIZE);

            assert_eq!(chunks.len(), length.div_ceil(MESSAGE_CHUNK_SIZE), "length {length}");
            let (last, full) = chunks.split_last().expect("at least one chunk");
            assert!(full.iter().all(|chunk| chunk.chars().count() == MESSAGE_CHUNK_SIZE));
            let expected_last = match length % MESSAGE_CHUNK_SIZE {
                0 => MESSAGE_CHUNK_SIZE,
                rest => rest,
            };
            assert_eq!(last.chars().count(), expected_last, "length {length}");
            assert_eq!(chunks.concat(), text);
        }
    }

    #[test]
    fn chunking_keeps_mixed_width_text_intact() {
        let text = "ab가나🙂cd";
        let chunks = chunk_text(text, 2);
        assert_eq!(chunks, vec!["ab", "가나", "🙂c", "d"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", MESSAGE_CHUNK_SIZE).is_empty());
    }

    #[tokio::test]
    async fn dispatcher_posts_chunks_in_order() {
        let api = Arc::new(RecordingApi::default());
        let dispatcher = MessageDispatcher::with_chunk_size(api.clone(), 4);

        let report = dispatcher.send_long_message("C1", "0123456789").await;

        assert_eq!(report, DispatchReport { sent: 3, failed: 0 });
        let posts = api.posts.lock().expect("lock");
        let texts: Vec<&str> = posts.iter().map(|(_, text)| text.as_str()).collect();
        assert_eq!(texts, vec!["0123", "4567", "89"]);
        assert!(posts.iter().all(|(channel, _)| channel == "C1"));
    }

    #[tokio::test]
    async fn dispatcher_continues_after_a_failed_chunk() {
        let api = Arc::new(RecordingApi { failing_post_indexes: vec![1], ..Default::default() });
        let dispatcher = MessageDispatcher::with_chunk_size(api.clone(), 3);

        let report = dispatcher.send_long_message("C1", "aaabbbccc").await;

        assert_eq!(report, DispatchReport { sent: 2, failed: 1 });
        assert_eq!(api.posts.lock().expect("lock").len(), 3);
    }
}
