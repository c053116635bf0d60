//! Question sources for quiz runs.
//!
//! The AI provider talks to an OpenAI-compatible `chat/completions` endpoint.

use std::env;

use async_trait::async_trait;
use quiz_core::model::{Explanation, Question, QuestionId, QuizConfig, UserPreferences};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Clock;
use crate::error::GenerationError;

/// Produces the question list for a configured quiz.
///
/// Implementations may return fewer questions than requested; callers treat the returned
/// length as authoritative.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns `GenerationError` when no usable question list can be produced.
    async fn generate(
        &self,
        config: &QuizConfig,
        preferences: &UserPreferences,
    ) -> Result<Vec<Question>, GenerationError>;
}

//
// ─── STATIC ────────────────────────────────────────────────────────────────────
//

/// Serves a fixed list, truncated to the requested count.
#[derive(Debug, Clone, Default)]
pub struct StaticQuestionProvider {
    questions: Vec<Question>,
}

impl StaticQuestionProvider {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// Build from a JSON document in the provider response shape.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Malformed` if the document cannot be parsed.
    pub fn from_json(raw: &str) -> Result<Self, GenerationError> {
        let questions = parse_questions(raw)?
            .into_iter()
            .enumerate()
            .map(|(idx, q)| {
                let id = q.id.clone().unwrap_or_else(|| format!("q{}", idx + 1));
                q.into_question(id)
            })
            .collect();
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionProvider for StaticQuestionProvider {
    async fn generate(
        &self,
        config: &QuizConfig,
        _preferences: &UserPreferences,
    ) -> Result<Vec<Question>, GenerationError> {
        let limit = usize::try_from(config.question_count()).unwrap_or(usize::MAX);
        Ok(self.questions.iter().take(limit).cloned().collect())
    }
}

//
// ─── AI ────────────────────────────────────────────────────────────────────────
//

pub const DEFAULT_AI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug)]
pub struct AiProviderConfig {
    pub base_url: Url,
    pub api_key: String,
    pub model: String,
}

impl AiProviderConfig {
    /// Read `EXAMPREP_AI_API_KEY`, `EXAMPREP_AI_BASE_URL` and `EXAMPREP_AI_MODEL`.
    ///
    /// Returns `Ok(None)` when no API key is set.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidBaseUrl` if the base URL does not parse.
    pub fn from_env() -> Result<Option<Self>, GenerationError> {
        let Some(api_key) = env::var("EXAMPREP_AI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
        else {
            return Ok(None);
        };
        let base_url =
            env::var("EXAMPREP_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_AI_BASE_URL.into());
        let model = env::var("EXAMPREP_AI_MODEL").unwrap_or_else(|_| DEFAULT_AI_MODEL.into());
        Ok(Some(Self::new(&base_url, api_key, model)?))
    }

    /// # Errors
    ///
    /// Returns `GenerationError::InvalidBaseUrl` if `base_url` does not parse.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            base_url: Url::parse(base_url.trim())?,
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[derive(Clone)]
pub struct AiQuestionProvider {
    client: Client,
    config: Option<AiProviderConfig>,
    clock: Clock,
}

impl AiQuestionProvider {
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidBaseUrl` for a malformed configured URL.
    pub fn from_env(clock: Clock) -> Result<Self, GenerationError> {
        Ok(Self::new(AiProviderConfig::from_env()?, clock))
    }

    #[must_use]
    pub fn new(config: Option<AiProviderConfig>, clock: Clock) -> Self {
        Self {
            client: Client::new(),
            config,
            clock,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl QuestionProvider for AiQuestionProvider {
    async fn generate(
        &self,
        config: &QuizConfig,
        preferences: &UserPreferences,
    ) -> Result<Vec<Question>, GenerationError> {
        let provider = self.config.as_ref().ok_or(GenerationError::Disabled)?;

        let payload = ChatRequest {
            model: provider.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(config, preferences),
            }],
            temperature: 0.4,
        };

        tracing::debug!(
            model = %provider.model,
            count = config.question_count(),
            "requesting questions"
        );
        let response = self
            .client
            .post(provider.completions_url())
            .bearer_auth(&provider.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GenerationError::Empty)?;

        let millis = self.clock.now().timestamp_millis();
        let questions: Vec<Question> = parse_questions(&content)?
            .into_iter()
            .enumerate()
            .map(|(idx, q)| q.into_question(format!("ai-gen-{idx}-{millis}")))
            .collect();
        if questions.is_empty() {
            return Err(GenerationError::Empty);
        }
        for question in &questions {
            question.validate()?;
        }
        Ok(questions)
    }
}

/// Instruction text sent to the model.
#[must_use]
pub fn build_prompt(config: &QuizConfig, preferences: &UserPreferences) -> String {
    let topics = if config.topics().is_empty() {
        "General syllabus topics".to_string()
    } else {
        config.topics().join(", ")
    };

    let mut prompt = format!(
        "Generate {count} multiple-choice questions for the {exam} domain.\n\
         Subject: {subject}\n\
         Topics: {topics}\n\
         Difficulty: {difficulty}\n",
        count = config.question_count(),
        exam = config.exam(),
        subject = config.subject(),
        difficulty = config.difficulty(),
    );

    if !preferences.preferred_topics.is_empty() {
        prompt.push_str(&format!(
            "\nUser Context:\n- Preferred Topics: {}\n\
             Instruction: If the user's preferred topics fall within the requested Subject ({}), \
             prioritize generating questions for them.\n",
            preferences.preferred_topics.join(", "),
            config.subject(),
        ));
    }

    prompt.push_str(
        "\nREQUIREMENTS:\n\
         1. Use markdown code blocks for code and LaTeX for mathematical expressions.\n\
         2. Provide exactly 4 options for each question.\n\
         3. The 'correctIndex' must be 0, 1, 2, or 3.\n\
         4. Give an 'explanation' object with 'concept', 'steps', 'tricks' and an optional 'visualAid' SVG string.\n\
         5. Return STRICT JSON: an array of objects with 'text', 'options', 'correctIndex', 'explanation'.\n",
    );
    prompt
}

//
// ─── WIRE FORMAT ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(default)]
    id: Option<String>,
    text: String,
    options: Vec<String>,
    correct_index: u8,
    explanation: Explanation,
}

impl RawQuestion {
    fn into_question(self, id: String) -> Question {
        Question {
            id: QuestionId::new(id),
            text: self.text,
            options: self.options,
            correct_index: self.correct_index,
            explanation: self.explanation,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
    List(Vec<RawQuestion>),
    Wrapped { questions: Vec<RawQuestion> },
}

/// Accept a bare array or `{"questions": [...]}`, optionally inside a markdown fence.
fn parse_questions(raw: &str) -> Result<Vec<RawQuestion>, GenerationError> {
    let body = strip_code_fence(raw);
    let payload: RawPayload =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    Ok(match payload {
        RawPayload::List(questions) | RawPayload::Wrapped { questions } => questions,
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::test_support::{config, question_list};
    use quiz_core::model::{QuizConfigDraft, QuizMode};
    use quiz_core::time::fixed_clock;

    const SAMPLE: &str = r#"[
        {
            "text": "2 + 2 = ?",
            "options": ["3", "4", "5", "6"],
            "correctIndex": 1,
            "explanation": {"concept": "Addition", "steps": ["Add"], "tricks": []}
        }
    ]"#;

    #[test]
    fn parses_bare_and_fenced_payloads() {
        assert_eq!(parse_questions(SAMPLE).unwrap().len(), 1);
        let fenced = format!("```json\n{SAMPLE}\n```");
        assert_eq!(parse_questions(&fenced).unwrap().len(), 1);
        let wrapped = format!("{{\"questions\": {SAMPLE}}}");
        let parsed = parse_questions(&wrapped).unwrap();
        assert_eq!(parsed[0].correct_index, 1);
        assert_eq!(parsed[0].explanation.visual_aid, None);
    }

    #[test]
    fn malformed_payload_is_reported() {
        let err = parse_questions("not json").unwrap_err();
        assert!(matches!(err, GenerationError::Malformed(_)));
    }

    #[test]
    fn prompt_mentions_configuration_and_preferences() {
        let cfg = config(QuizMode::Solo);
        let prefs = UserPreferences::with_topics(["Syllogism"]);
        let prompt = build_prompt(&cfg, &prefs);
        assert!(prompt.contains("Generate 5 multiple-choice questions for the RRB NTPC domain."));
        assert!(prompt.contains("Topics: Puzzles"));
        assert!(prompt.contains("Difficulty: medium"));
        assert!(prompt.contains("Preferred Topics: Syllogism"));

        let general = QuizConfigDraft::new("SBI PO", "English")
            .allow_general_syllabus(true)
            .validate()
            .unwrap();
        let prompt = build_prompt(&general, &UserPreferences::default());
        assert!(prompt.contains("Topics: General syllabus topics"));
        assert!(!prompt.contains("User Context"));
    }

    #[test]
    fn static_json_assigns_missing_ids() {
        let provider = StaticQuestionProvider::from_json(SAMPLE).unwrap();
        assert_eq!(provider.len(), 1);
        assert_eq!(provider.questions[0].id.as_str(), "q1");
    }

    #[tokio::test]
    async fn static_provider_truncates_to_requested_count() {
        let provider = StaticQuestionProvider::new(question_list(8));
        let questions = provider
            .generate(&config(QuizMode::Solo), &UserPreferences::default())
            .await
            .unwrap();
        assert_eq!(questions.len(), 5);
    }

    #[tokio::test]
    async fn unconfigured_ai_provider_is_disabled() {
        let provider = AiQuestionProvider::new(None, fixed_clock());
        assert!(!provider.enabled());
        let err = provider
            .generate(&config(QuizMode::Solo), &UserPreferences::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Disabled));
    }

    #[test]
    fn provider_config_rejects_bad_urls() {
        assert!(matches!(
            AiProviderConfig::new("not a url", "key", "model"),
            Err(GenerationError::InvalidBaseUrl(_))
        ));
        let cfg = AiProviderConfig::new("https://example.test/v1/", "key", "model").unwrap();
        assert_eq!(cfg.completions_url(), "https://example.test/v1/chat/completions");
    }
}
