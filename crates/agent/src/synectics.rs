use std::sync::Arc;

use async_trait::async_trait;
use ideameet_core::errors::ApplicationError;
use ideameet_core::ports::IdeaGenerator;
use tracing::info;

use crate::llm::LlmClient;

pub struct LlmIdeaGenerator {
    llm: Arc<dyn LlmClient>,
}

impl LlmIdeaGenerator {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

pub fn build_synectics_prompt(word_a: &str, word_b: &str) -> String {
    format!(
        "시네틱스(Synectics) 기법으로 서로 관련 없어 보이는 두 단어 '{word_a}'와 '{word_b}'를 \
         결합하세요.\n\
         1. 두 단어의 공통된 속성이나 유추를 한 줄로 찾고,\n\
         2. 그 유추에서 출발한 창의적인 아이디어 문장 3개를 번호를 붙여 제시하세요."
    )
}

#[async_trait]
impl IdeaGenerator for LlmIdeaGenerator {
    async fn synectics(&self, word_a: &str, word_b: &str) -> Result<String, ApplicationError> {
        let prompt = build_synectics_prompt(word_a, word_b);
        let idea = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|error| ApplicationError::Integration(format!("{error:#}")))?;

        info!(event_name = "agent.synectics.generated", word_a, word_b, "synectics idea generated");
        Ok(idea)
    }
}
