use std::sync::Arc;

use ideameet_core::errors::ApplicationError;
use ideameet_core::ports::{IdeaGenerator, Summarizer, TopicLookup};
use thiserror::Error;
use tracing::{error, info, Instrument, Span};

use crate::commands::BackgroundJob;
use crate::dispatch::{DispatchReport, MessageDispatcher};
use crate::messages::{error_notice, ResultKind, ResultMessage};
use crate::web_api::{SlackApi, SlackApiError};

/// Number of recent channel messages handed to the summarizer.
pub const HISTORY_LIMIT: u32 = 10;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    History(#[from] SlackApiError),
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

/// Schedules a job without waiting for it.
pub trait JobSpawner: Send + Sync {
    fn spawn(&self, job: BackgroundJob);
}

pub struct JobRunner {
    slack: Arc<dyn SlackApi>,
    dispatcher: MessageDispatcher,
    topics: Arc<dyn TopicLookup>,
    summarizer: Arc<dyn Summarizer>,
    ideas: Arc<dyn IdeaGenerator>,
    history_limit: u32,
}

impl JobRunner {
    pub fn new(
        slack: Arc<dyn SlackApi>,
        topics: Arc<dyn TopicLookup>,
        summarizer: Arc<dyn Summarizer>,
        ideas: Arc<dyn IdeaGenerator>,
    ) -> Self {
        Self {
            dispatcher: MessageDispatcher::new(slack.clone()),
            slack,
            topics,
            summarizer,
            ideas,
            history_limit: HISTORY_LIMIT,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: MessageDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Runs one job to completion. Failures end up as a single error notice in
    /// the job's channel and are never returned.
    pub async fn run(&self, job: BackgroundJob) {
        let kind = job.kind();
        let channel_id = job.channel_id().to_owned();

        let outcome = match job {
            BackgroundJob::Summarize { channel_id, email } => {
                self.process_summary(&channel_id, &email).await
            }
            BackgroundJob::Synectics { channel_id, word_a, word_b } => {
                self.process_synectics(&channel_id, &word_a, &word_b).await
            }
        };

        match outcome {
            Ok(report) => info!(
                event_name = "slack.job.completed",
                kind = kind.label(),
                channel_id = %channel_id,
                chunks_sent = report.sent,
                chunks_failed = report.failed,
                "background job completed"
            ),
            Err(failure) => {
                error!(
                    event_name = "slack.job.failed",
                    kind = kind.label(),
                    channel_id = %channel_id,
                    error = %failure,
                    "background job failed"
                );
                let notice = error_notice(kind, &failure.to_string());
                if let Err(post_error) = self.slack.post_message(&channel_id, &notice).await {
                    error!(
                        event_name = "slack.job.notice_failed",
                        channel_id = %channel_id,
                        error = %post_error,
                        "failed to post error notice"
                    );
                }
            }
        }
    }

    async fn process_summary(
        &self,
        channel_id: &str,
        email: &str,
    ) -> Result<DispatchReport, JobError> {
        let messages = self.slack.recent_messages(channel_id, self.history_limit).await?;
        let topic = self.topics.topic_for_email(email).await?;
        let summary = self.summarizer.summarize(&messages, topic.as_deref()).await?;

        let message = ResultMessage::new(ResultKind::Summary, summary);
        Ok(self.dispatcher.send_long_message(channel_id, &message.render()).await)
    }

    async fn process_synectics(
        &self,
        channel_id: &str,
        word_a: &str,
        word_b: &str,
    ) -> Result<DispatchReport, JobError> {
        let idea = self.ideas.synectics(word_a, word_b).await?;

        let message = ResultMessage::new(ResultKind::Synectics, idea);
        Ok(self.dispatcher.send_long_message(channel_id, &message.render()).await)
    }
}

/// Runs each job on the tokio runtime, detached from the request that
/// scheduled it.
pub struct TokioJobSpawner {
    runner: Arc<JobRunner>,
}

impl TokioJobSpawner {
    pub fn new(runner: Arc<JobRunner>) -> Self {
        Self { runner }
    }
}

impl JobSpawner for TokioJobSpawner {
    fn spawn(&self, job: BackgroundJob) {
        let runner = self.runner.clone();
        tokio::spawn(async move { runner.run(job).await }.instrument(Span::current()));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use ideameet_core::errors::ApplicationError;
    use ideameet_core::ports::{IdeaGenerator, Summarizer, TopicLookup};

    use super::{JobRunner, JobSpawner, TokioJobSpawner, HISTORY_LIMIT};
    use crate::commands::BackgroundJob;
    use crate::dispatch::MessageDispatcher;
    use crate::web_api::{SlackApi, SlackApiError};

    #[derive(Default)]
    struct FakeSlack {
        history: Vec<String>,
        history_fails: bool,
        posts: Mutex<Vec<(String, String)>>,
        requested_limits: Mutex<Vec<u32>>,
    }

    impl FakeSlack {
        fn posted_texts(&self) -> Vec<String> {
            self.posts.lock().expect("lock").iter().map(|(_, text)| text.clone()).collect()
        }
    }

    #[async_trait]
    impl SlackApi for FakeSlack {
        async fn user_email(&self, _user_id: &str) -> Result<Option<String>, SlackApiError> {
            Ok(None)
        }

        async fn recent_messages(
            &self,
            _channel_id: &str,
            limit: u32,
        ) -> Result<Vec<String>, SlackApiError> {
            self.requested_limits.lock().expect("lock").push(limit);
            if self.history_fails {
                return Err(SlackApiError::Api {
                    method: "conversations.history",
                    error: "channel_not_found".to_owned(),
                });
            }
            Ok(self.history.clone())
        }

        async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackApiError> {
            self.posts.lock().expect("lock").push((channel_id.to_owned(), text.to_owned()));
            Ok(())
        }
    }

    struct FixedTopic(Option<&'static str>);

    #[async_trait]
    impl TopicLookup for FixedTopic {
        async fn topic_for_email(&self, _email: &str) -> Result<Option<String>, ApplicationError> {
            Ok(self.0.map(str::to_owned))
        }
    }

    #[derive(Default)]
    struct RecordingSummarizer {
        fail_with: Option<&'static str>,
        output: String,
        calls: Mutex<Vec<(Vec<String>, Option<String>)>>,
    }

    #[async_trait]
    impl Summarizer for RecordingSummarizer {
        async fn summarize(
            &self,
            messages: &[String],
            topic: Option<&str>,
        ) -> Result<String, ApplicationError> {
            self.calls.lock().expect("lock").push((messages.to_vec(), topic.map(str::to_owned)));
            match self.fail_with {
                Some(reason) => Err(ApplicationError::Integration(reason.to_owned())),
                None => Ok(self.output.clone()),
            }
        }
    }

    struct EchoIdeas {
        fail: bool,
    }

    #[async_trait]
    impl IdeaGenerator for EchoIdeas {
        async fn synectics(&self, word_a: &str, word_b: &str) -> Result<String, ApplicationError> {
            if self.fail {
                return Err(ApplicationError::Integration("quota exceeded".to_owned()));
            }
            Ok(format!("{word_a}를 닮은 {word_b}"))
        }
    }

    fn runner(
        slack: Arc<FakeSlack>,
        summarizer: Arc<RecordingSummarizer>,
        ideas_fail: bool,
    ) -> JobRunner {
        JobRunner::new(
            slack,
            Arc::new(FixedTopic(Some("신규 서비스 기획"))),
            summarizer,
            Arc::new(EchoIdeas { fail: ideas_fail }),
        )
    }

    fn summarize_job() -> BackgroundJob {
        BackgroundJob::Summarize { channel_id: "C1".to_owned(), email: "minji@team.io".to_owned() }
    }

    #[tokio::test]
    async fn summary_posts_labelled_result_built_from_history_and_topic() {
        let slack = Arc::new(FakeSlack {
            history: vec!["첫 번째".to_owned(), "두 번째".to_owned()],
            ..Default::default()
        });
        let summarizer =
            Arc::new(RecordingSummarizer { output: "두 안건 논의".to_owned(), ..Default::default() });

        runner(slack.clone(), summarizer.clone(), false).run(summarize_job()).await;

        assert_eq!(slack.posted_texts(), vec!["📝 *요약 결과:*\n두 안건 논의".to_owned()]);
        assert_eq!(*slack.requested_limits.lock().expect("lock"), vec![HISTORY_LIMIT]);
        let calls = summarizer.calls.lock().expect("lock");
        assert_eq!(calls[0].0, vec!["첫 번째".to_owned(), "두 번째".to_owned()]);
        assert_eq!(calls[0].1.as_deref(), Some("신규 서비스 기획"));
    }

    #[tokio::test]
    async fn summarizer_failure_posts_exactly_one_notice() {
        let slack = Arc::new(FakeSlack::default());
        let summarizer = Arc::new(RecordingSummarizer {
            fail_with: Some("model offline"),
            ..Default::default()
        });

        runner(slack.clone(), summarizer, false).run(summarize_job()).await;

        let posts = slack.posted_texts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].starts_with("❌ 요약 생성 중 오류 발생: "));
        assert!(posts[0].contains("model offline"));
    }

    #[tokio::test]
    async fn history_failure_is_reported_and_skips_the_summarizer() {
        let slack = Arc::new(FakeSlack { history_fails: true, ..Default::default() });
        let summarizer = Arc::new(RecordingSummarizer::default());

        runner(slack.clone(), summarizer.clone(), false).run(summarize_job()).await;

        let posts = slack.posted_texts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].contains("channel_not_found"));
        assert!(summarizer.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn long_summaries_are_chunked_in_order() {
        let slack = Arc::new(FakeSlack::default());
        let summarizer =
            Arc::new(RecordingSummarizer { output: "가".repeat(30), ..Default::default() });

        runner(slack.clone(), summarizer, false)
            .with_dispatcher(MessageDispatcher::with_chunk_size(slack.clone(), 16))
            .run(summarize_job())
            .await;

        let posts = slack.posted_texts();
        assert!(posts.len() > 1);
        assert!(posts[0].starts_with("📝 *요약 결과:*"));
        assert_eq!(posts.concat(), format!("📝 *요약 결과:*\n{}", "가".repeat(30)));
    }

    #[tokio::test]
    async fn synectics_posts_result_or_one_notice() {
        let job = || BackgroundJob::Synectics {
            channel_id: "C2".to_owned(),
            word_a: "피자".to_owned(),
            word_b: "자전거".to_owned(),
        };

        let slack = Arc::new(FakeSlack::default());
        runner(slack.clone(), Arc::default(), false).run(job()).await;
        assert_eq!(slack.posted_texts(), vec!["💬 *시네틱스 결과:*\n피자를 닮은 자전거".to_owned()]);

        let slack = Arc::new(FakeSlack::default());
        runner(slack.clone(), Arc::default(), true).run(job()).await;
        assert_eq!(
            slack.posted_texts(),
            vec!["❌ 시네틱스 생성 중 오류 발생: integration failure: quota exceeded".to_owned()]
        );
        assert!(slack.posts.lock().expect("lock").iter().all(|(channel, _)| channel == "C2"));
    }

    #[tokio::test]
    async fn tokio_spawner_runs_job_in_background() {
        let slack = Arc::new(FakeSlack::default());
        let summarizer =
            Arc::new(RecordingSummarizer { output: "완료".to_owned(), ..Default::default() });
        let spawner = TokioJobSpawner::new(Arc::new(runner(slack.clone(), summarizer, false)));

        spawner.spawn(summarize_job());

        for _ in 0..100 {
            if !slack.posted_texts().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(slack.posted_texts(), vec!["📝 *요약 결과:*\n완료".to_owned()]);
    }
}
