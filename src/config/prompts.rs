//! Prompt templates for Trendlens.
//!
//! Prompts can be customized by placing an `insights.toml` file in the custom prompts directory.

use crate::insights::{Corpus, Question};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([\w.-]+)\}\}").expect("Invalid regex"));

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub insights: InsightPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the insight pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightPrompts {
    /// Persona; rendered with `{{topic}}` and `{{goal}}`.
    pub system: String,
    /// First user message; rendered with `{{question}}` and `{{metadata}}`.
    pub question: String,
    /// Second user message; rendered with `{{chunk}}`.
    pub chunk: String,
    /// The question battery.
    pub questions: Vec<Question>,
}

impl Default for InsightPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a YouTube growth consultant. The user is researching videos about "{{topic}}" and wants to optimize for {{goal}}.

Guidelines:
- Answer only from the material you are given
- Be specific: name topics, formats and phrasings that appear in the material
- If the material does not address the question, say so in one sentence
- Keep the answer under 200 words"#
                .to_string(),

            question: r#"Question: {{question}}

Videos analyzed:
{{metadata}}"#
                .to_string(),

            chunk: r#"Material:
{{chunk}}"#
                .to_string(),

            questions: default_questions(),
        }
    }
}

fn default_questions() -> Vec<Question> {
    vec![
        Question::new(
            "prominent_channel",
            "Who is the most prominent channel in this category and what sets it apart?",
            Corpus::Transcripts,
        ),
        Question::new(
            "top_topics",
            "What are the top topics covered in these videos?",
            Corpus::Transcripts,
        ),
        Question::new(
            "positive_reactions",
            "What are the top positive reactions viewers have to these videos?",
            Corpus::Comments,
        ),
        Question::new(
            "negative_reactions",
            "What are the top negative reactions viewers have to these videos?",
            Corpus::Comments,
        ),
        Question::new(
            "requested_topics",
            "Which topics are viewers asking to see covered next?",
            Corpus::Comments,
        ),
        Question::new(
            "tired_topics",
            "Which topics or formats are viewers tired of?",
            Corpus::Comments,
        ),
        Question::new(
            "ideal_video",
            "Describe the ideal next video for this niche: topic, length, structure and title style.",
            Corpus::Transcripts,
        ),
    ]
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let insights_path = custom_path.join("insights.toml");
            if insights_path.exists() {
                let content = std::fs::read_to_string(&insights_path)?;
                prompts.insights = toml::from_str(&content)?;
            }
        }

        if prompts.insights.questions.is_empty() {
            return Err(crate::error::TrendlensError::Config(
                "insight prompts define no questions".to_string(),
            ));
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Single pass: text coming from a value is never expanded again, and
    /// placeholders without a value are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER_REGEX
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
