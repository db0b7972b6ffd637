//! Syllabus topic outline extraction
//!
//! The model is asked for `{"topics":[{"topic":..., "subtopics":[...]}]}`
//! but free-text output is unreliable, so parsing is best-effort:
//! code fences are stripped, surrounding prose is skipped, malformed entries
//! are dropped and obvious noise (page numbers, bare digits, equations,
//! fragments) is filtered out. Any failure degrades to "no outline".

use crate::error::GenerationError;
use crate::failover::FailoverCaller;
use crate::prompts::TOPIC_EXTRACTION_PROMPT;
use crate::providers::{DocumentRef, GenerationRequest};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Entries shorter than this (in characters, after trimming) are noise
const MIN_ENTRY_CHARS: usize = 3;

/// One syllabus topic and its sub-topics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "topic")]
    pub name: String,
    pub subtopics: Vec<String>,
}

/// Ordered topic outline of an indexed syllabus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicOutline {
    pub topics: Vec<Topic>,
}

impl TopicOutline {
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }
}

impl fmt::Display for TopicOutline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, topic) in self.topics.iter().enumerate() {
            writeln!(f, "{}. {}", index + 1, topic.name)?;
            for subtopic in &topic.subtopics {
                writeln!(f, "   - {}", subtopic)?;
            }
        }
        Ok(())
    }
}

/// Why a model answer could not be turned into an outline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Topic outline parse failed: {0}")]
pub struct ParseFailed(pub String);

/// Asks the model for the document's outline
///
/// Never fails: generation errors and unparseable answers are logged as
/// warnings and yield `None`.
pub async fn extract_topics(
    caller: &FailoverCaller,
    model: &str,
    document: DocumentRef,
) -> Option<TopicOutline> {
    let request = GenerationRequest::new(model, TOPIC_EXTRACTION_PROMPT).with_document(document);

    match caller.generate(&request).await {
        Ok(text) => parse_outline(&text),
        Err(GenerationError::NoCredentials) => {
            tracing::warn!("Skipping topic extraction: no API keys configured");
            None
        }
        Err(e) => {
            tracing::warn!("Topic extraction failed: {}", e);
            None
        }
    }
}

/// Best-effort parse of a model answer into an outline
///
/// # Examples
///
/// ```
/// use syllabus_tutor::topics::parse_outline;
///
/// let text = "```json\n{\"topics\":[{\"topic\":\"Matrices\",\"subtopics\":[\"x=1\",\"Determinants\"]}]}\n```";
/// let outline = parse_outline(text).unwrap();
/// assert_eq!(outline.topics[0].name, "Matrices");
/// assert_eq!(outline.topics[0].subtopics, vec!["Determinants"]);
///
/// assert!(parse_outline("I could not read the file.").is_none());
/// ```
pub fn parse_outline(text: &str) -> Option<TopicOutline> {
    match try_parse_outline(text) {
        Ok(outline) => {
            tracing::debug!("Parsed outline with {} topic(s)", outline.len());
            Some(outline)
        }
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}

/// Strict variant of [`parse_outline`] that reports the failure reason
pub fn try_parse_outline(text: &str) -> Result<TopicOutline, ParseFailed> {
    let root = parse_json_object(strip_code_fences(text))
        .ok_or_else(|| ParseFailed("answer is not a JSON object".to_string()))?;

    let entries = root
        .get("topics")
        .ok_or_else(|| ParseFailed("missing \"topics\" field".to_string()))?
        .as_array()
        .ok_or_else(|| ParseFailed("\"topics\" is not a list".to_string()))?;

    let topics = entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("topic")?.as_str()?.trim();
            if is_noise(name) {
                return None;
            }

            let subtopics = entry
                .get("subtopics")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !is_noise(s))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            Some(Topic {
                name: name.to_string(),
                subtopics,
            })
        })
        .collect();

    Ok(TopicOutline { topics })
}

/// Removes a surrounding Markdown code fence, with or without a language tag
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };

    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parses `text` as a JSON object, falling back to its outermost `{...}` span
fn parse_json_object(text: &str) -> Option<Value> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

fn page_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:page|pg\.?|p\.)\s*\d+\b").expect("page number pattern is valid")
    })
}

/// Heuristic noise filter for outline entries
fn is_noise(entry: &str) -> bool {
    let entry = entry.trim();
    entry.chars().count() < MIN_ENTRY_CHARS
        || entry.contains('=')
        || entry.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ')')
        || page_number_pattern().is_match(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialPool;
    use crate::providers::ProviderError;
    use crate::test_utils::ScriptedGenerator;
    use std::sync::Arc;

    #[test]
    fn test_page_number_topic_is_filtered() {
        let outline = parse_outline(r#"{"topics":[{"topic":"Page 3","subtopics":[]}]}"#).unwrap();
        assert!(outline.is_empty());
    }

    #[test]
    fn test_equation_subtopic_is_filtered() {
        let outline = parse_outline(
            r#"{"topics":[{"topic":"Matrices","subtopics":["x=1","Determinants"]}]}"#,
        )
        .unwrap();
        assert_eq!(
            outline.topics,
            vec![Topic {
                name: "Matrices".to_string(),
                subtopics: vec!["Determinants".to_string()],
            }]
        );
    }

    #[test]
    fn test_fenced_and_unfenced_inputs_agree() {
        let raw = r#"{"topics":[{"topic":"Calculus","subtopics":["Limits","Derivatives"]}]}"#;
        let fenced = format!("```json\n{}\n```", raw);
        let bare_fence = format!("```\n{}\n```", raw);
        let expected = parse_outline(raw).unwrap();
        assert_eq!(parse_outline(&fenced).unwrap(), expected);
        assert_eq!(parse_outline(&bare_fence).unwrap(), expected);
        assert_eq!(expected.topics[0].subtopics.len(), 2);
    }

    #[test]
    fn test_prose_around_json_is_skipped() {
        let text = "Here is the outline you asked for:\n{\"topics\":[{\"topic\":\"Probability\",\"subtopics\":[\"Bayes theorem\"]}]}\nLet me know!";
        let outline = parse_outline(text).unwrap();
        assert_eq!(outline.topics[0].name, "Probability");
    }

    #[test]
    fn test_malformed_inputs_yield_none() {
        assert!(parse_outline("").is_none());
        assert!(parse_outline("```json\n{\"topics\": [\n```").is_none());
        assert!(parse_outline("[1, 2, 3]").is_none());
        assert!(parse_outline(r#"{"sections": []}"#).is_none());
        assert!(parse_outline(r#"{"topics": "Matrices"}"#).is_none());
    }

    #[test]
    fn test_try_parse_reports_reason() {
        let err = try_parse_outline(r#"{"topics": {}}"#).unwrap_err();
        assert!(err.to_string().contains("not a list"));
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let outline = parse_outline(
            r#"{"topics":[
                {"topic": 42, "subtopics": ["Orphan"]},
                {"subtopics": ["Nameless"]},
                {"topic": "  Linear Algebra  ", "subtopics": ["Vectors", 7, null, "12", "ab", "pg. 4"]},
                {"topic": "Statistics"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(outline.len(), 2);
        assert_eq!(outline.topics[0].name, "Linear Algebra");
        assert_eq!(outline.topics[0].subtopics, vec!["Vectors"]);
        assert!(outline.topics[1].subtopics.is_empty());
    }

    #[test]
    fn test_noise_heuristics() {
        assert!(is_noise("12"));
        assert!(is_noise("3."));
        assert!(is_noise("Page 12"));
        assert!(is_noise("p. 7"));
        assert!(is_noise("PG 2 of 9"));
        assert!(is_noise("a+b=c"));
        assert!(is_noise("ab"));
        assert!(!is_noise("Pagerank"));
        assert!(!is_noise("Set Theory"));
        assert!(!is_noise("Unit 1: Sets"));
    }

    #[test]
    fn test_single_line_fence() {
        assert_eq!(strip_code_fences("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_outline_display() {
        let outline = TopicOutline {
            topics: vec![Topic {
                name: "Matrices".to_string(),
                subtopics: vec!["Determinants".to_string()],
            }],
        };
        assert_eq!(outline.to_string(), "1. Matrices\n   - Determinants\n");
    }

    #[test]
    fn test_outline_serializes_to_contract_shape() {
        let outline = TopicOutline {
            topics: vec![Topic {
                name: "Sets".to_string(),
                subtopics: vec![],
            }],
        };
        let json = serde_json::to_string(&outline).unwrap();
        assert_eq!(json, r#"{"topics":[{"topic":"Sets","subtopics":[]}]}"#);
    }

    fn document() -> DocumentRef {
        DocumentRef {
            uri: "https://files/abc".to_string(),
            mime_type: "image/png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_extract_topics_uses_topic_model_and_document() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Ok(
            "```json\n{\"topics\":[{\"topic\":\"Graphs\",\"subtopics\":[\"Trees\"]}]}\n```"
                .to_string(),
        )]));
        let caller = FailoverCaller::new(
            Arc::new(CredentialPool::from_keys(["k1"])),
            generator.clone(),
        );

        let outline = extract_topics(&caller, "vision-model", document())
            .await
            .unwrap();
        assert_eq!(outline.topics[0].name, "Graphs");

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "vision-model");
        assert_eq!(requests[0].prompt, TOPIC_EXTRACTION_PROMPT);
        assert_eq!(requests[0].document, Some(document()));
        assert!(requests[0].system_instruction.is_none());
    }

    #[tokio::test]
    async fn test_extract_topics_swallows_generation_errors() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Err(ProviderError::Api {
            status: 500,
            message: "down".to_string(),
        })]));
        let caller = FailoverCaller::new(
            Arc::new(CredentialPool::from_keys(["k1"])),
            generator,
        );
        assert!(extract_topics(&caller, "m", document()).await.is_none());
    }
}
