use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use ideameet_core::errors::ApplicationError;
use ideameet_core::ports::Summarizer;
use tracing::info;

use crate::llm::LlmClient;

/// Reply used when the channel has no readable messages; the model is not called.
pub const EMPTY_HISTORY_SUMMARY: &str = "요약할 최근 대화 내용이 없습니다.";

pub struct LlmSummarizer {
    llm: Arc<dyn LlmClient>,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

pub fn build_summary_prompt(messages: &[String], topic: Option<&str>) -> String {
    let mut prompt =
        String::from("다음은 Slack 채널의 최근 대화입니다. 오래된 순서로 정렬되어 있습니다.\n");
    if let Some(topic) = topic.map(str::trim).filter(|topic| !topic.is_empty()) {
        let _ = writeln!(prompt, "회의 주제: {topic}");
    }
    prompt.push_str("\n[대화]\n");
    for message in messages {
        let _ = writeln!(prompt, "- {}", message.trim());
    }
    prompt.push_str(
        "\n위 대화에서 논의된 핵심 아이디어와 결정 사항을 3~5개의 글머리표로 요약하세요. \
         회의 주제가 주어졌다면 주제와 관련된 내용을 우선하세요.",
    );
    prompt
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        messages: &[String],
        topic: Option<&str>,
    ) -> Result<String, ApplicationError> {
        if messages.iter().all(|message| message.trim().is_empty()) {
            return Ok(EMPTY_HISTORY_SUMMARY.to_owned());
        }

        let prompt = build_summary_prompt(messages, topic);
        let summary = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|error| ApplicationError::Integration(format!("{error:#}")))?;

        info!(
            event_name = "agent.summary.generated",
            message_count = messages.len(),
            has_topic = topic.is_some(),
            "summary generated"
        );
        Ok(summary)
    }
}
