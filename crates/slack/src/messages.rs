//! User-facing texts of the bot.

pub const SUMMARIZE_KEYWORD: &str = "요약하기";
pub const SYNECTICS_KEYWORD: &str = "발상하기";

pub const HELP_TEXT: &str = concat!(
    ":robot_face: *아이디어 회의 Slack봇 사용법*\n\n",
    ":memo: *명령어 목록:*\n",
    "`/idea 요약하기` - 최근 대화 내용을 요약합니다.\n",
    "`/idea 발상하기 <단어1> <단어2>` - 두 단어를 기반으로 창의적인 문장을 생성합니다.\n\n",
    ":bulb: *시네틱스(Synectics)란?*\n",
    "> 서로 관련이 없어 보이는 두 개의 개념을 결합하여 창의적이고 혁신적인 아이디어를 ",
    "도출하는 기법입니다.\n\n",
    ":exclamation: *사용 예시:*\n",
    "`/idea 요약하기`\n",
    "`/idea 발상하기 피자 자전거`\n",
);

pub const EMAIL_UNRESOLVED_TEXT: &str =
    "❗ 사용자 이메일을 조회할 수 없습니다. 관리자에게 문의하세요.";

pub const SUMMARY_PENDING_TEXT: &str = "📝 최근 대화 내용을 요약 중입니다. 잠시만 기다려주세요!";

pub const SYNECTICS_USAGE_TEXT: &str =
    "❗ *발상하기* 명령어 사용법: `/idea 발상하기 <단어1> <단어2>`";

pub const SIGNATURE_REJECTED_TEXT: &str = "❗ 요청 서명을 확인할 수 없습니다.";

pub fn synectics_pending_text(word_a: &str, word_b: &str) -> String {
    format!("💡 *'{word_a}'*와 *'{word_b}'*를 기반으로 창의적인 문장을 생성 중입니다!")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultKind {
    Summary,
    Synectics,
}

impl ResultKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Summary => "요약",
            Self::Synectics => "시네틱스",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Summary => "📝",
            Self::Synectics => "💬",
        }
    }
}

/// Output of one of the generators, ready to be posted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultMessage {
    pub kind: ResultKind,
    pub body: String,
}

impl ResultMessage {
    pub fn new(kind: ResultKind, body: impl Into<String>) -> Self {
        Self { kind, body: body.into() }
    }

    pub fn render(&self) -> String {
        format!("{} *{} 결과:*\n{}", self.kind.emoji(), self.kind.label(), self.body)
    }
}

pub fn error_notice(kind: ResultKind, description: &str) -> String {
    format!("❌ {} 생성 중 오류 발생: {description}", kind.label())
}

#[cfg(test)]
mod tests {
    use super::{error_notice, synectics_pending_text, ResultKind, ResultMessage, HELP_TEXT};

    #[test]
    fn result_message_starts_with_emoji_and_label() {
        let summary = ResultMessage::new(ResultKind::Summary, "세 가지 안건이 논의됨").render();
        assert_eq!(summary, "📝 *요약 결과:*\n세 가지 안건이 논의됨");

        let synectics = ResultMessage::new(ResultKind::Synectics, "바퀴 달린 피자 배달").render();
        assert!(synectics.starts_with("💬 *시네틱스 결과:*\n"));
    }

    #[test]
    fn error_notice_names_the_failed_step() {
        assert_eq!(
            error_notice(ResultKind::Summary, "timeout"),
            "❌ 요약 생성 중 오류 발생: timeout"
        );
        assert_eq!(
            error_notice(ResultKind::Synectics, "quota"),
            "❌ 시네틱스 생성 중 오류 발생: quota"
        );
    }

    #[test]
    fn help_text_lists_both_commands() {
        assert!(HELP_TEXT.contains("`/idea 요약하기`"));
        assert!(HELP_TEXT.contains("`/idea 발상하기 <단어1> <단어2>`"));
        assert!(synectics_pending_text("피자", "자전거").contains("*'피자'*와 *'자전거'*"));
    }
}
