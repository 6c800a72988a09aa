//! Built-in local patterns
//!
//! Small in-process handlers installed at start-up. Their heuristics are
//! deliberately simple and can be swapped for better implementations without
//! touching the registry.
//!
//! | id | parameters |
//! |----|------------|
//! | `summarize` | `length`: `short` \| `medium` \| `long` (default `medium`) |
//! | `extract` | `target`: `emails` \| `urls` \| `numbers` \| `hashtags` (default `emails`) |
//! | `convert_case` | `case`: `upper` \| `lower` \| `title` \| `snake` \| `kebab` (required) |

use crate::error::{PatternError, Result};
use crate::pattern::{Pattern, PatternDescriptor, PatternInput, PatternKind, PatternResult};
use crate::registry::PatternRegistry;
use async_trait::async_trait;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Register every built-in pattern
pub fn register_builtin_patterns(registry: &PatternRegistry) -> Result<()> {
    registry.register_pattern(SummarizePattern::new()?)?;
    registry.register_pattern(ExtractPattern::new()?)?;
    registry.register_pattern(ConvertCasePattern::new())?;
    Ok(())
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| PatternError::Unknown(format!("Invalid regex {}: {}", pattern, e)))
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
}

/// Extractive summary by sentence scoring
pub struct SummarizePattern {
    descriptor: PatternDescriptor,
    sentence_split: Regex,
}

impl SummarizePattern {
    pub fn new() -> Result<Self> {
        Ok(Self {
            descriptor: PatternDescriptor::new("summarize", "Summarize", PatternKind::Local)
                .with_description("Condense text to its most representative sentences"),
            sentence_split: compile(r"[.!?]+(\s+|$)")?,
        })
    }

    fn sentence_budget(length: &str) -> Option<usize> {
        match length {
            "short" => Some(1),
            "medium" => Some(3),
            "long" => Some(5),
            _ => None,
        }
    }

    fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in self.sentence_split.find_iter(text) {
            let sentence = text[start..m.end()].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = m.end();
        }
        let rest = text[start..].trim();
        if !rest.is_empty() {
            sentences.push(rest);
        }
        sentences
    }
}

#[async_trait]
impl Pattern for SummarizePattern {
    fn descriptor(&self) -> &PatternDescriptor {
        &self.descriptor
    }

    fn validate(&self, input: &PatternInput) -> bool {
        if input.text.trim().is_empty() {
            return false;
        }
        match input.parameters.get("length") {
            None => true,
            Some(value) => value.as_str().and_then(Self::sentence_budget).is_some(),
        }
    }

    async fn execute(&self, input: PatternInput) -> Result<PatternResult> {
        let start = Instant::now();
        let budget = Self::sentence_budget(input.parameter_str("length").unwrap_or("medium"))
            .unwrap_or(3);

        let sentences = self.sentences(&input.text);

        let mut frequencies: HashMap<String, usize> = HashMap::new();
        for word in words(&input.text).filter(|w| w.len() > 3) {
            *frequencies.entry(word.to_lowercase()).or_default() += 1;
        }

        // Rank by average word frequency, then restore document order
        let mut scored: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .map(|(index, sentence)| {
                let (total, count) = words(sentence).fold((0usize, 0usize), |(t, c), w| {
                    (t + frequencies.get(&w.to_lowercase()).copied().unwrap_or(0), c + 1)
                });
                let score = if count == 0 { 0.0 } else { total as f64 / count as f64 };
                (index, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(budget);
        scored.sort_by_key(|(index, _)| *index);

        let summary = scored
            .iter()
            .map(|(index, _)| sentences[*index])
            .collect::<Vec<_>>()
            .join(" ");

        let original_words = words(&input.text).count() as i64;
        let summary_words = words(&summary).count() as i64;

        Ok(PatternResult::success(summary, start.elapsed().as_secs_f64())
            .with_metadata("sentences", sentences.len() as i64)
            .with_metadata("selected", scored.len() as i64)
            .with_metadata("original_words", original_words)
            .with_metadata("summary_words", summary_words))
    }
}

/// Pulls structured tokens out of free text
pub struct ExtractPattern {
    descriptor: PatternDescriptor,
    extractors: HashMap<&'static str, Regex>,
}

impl ExtractPattern {
    pub fn new() -> Result<Self> {
        let mut extractors = HashMap::new();
        extractors.insert("emails", compile(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")?);
        extractors.insert("urls", compile(r#"https?://[^\s<>"']+"#)?);
        extractors.insert("numbers", compile(r"-?\d+(?:\.\d+)?")?);
        extractors.insert("hashtags", compile(r"#[A-Za-z0-9_]+")?);

        Ok(Self {
            descriptor: PatternDescriptor::new("extract", "Extract", PatternKind::Local)
                .with_description("Extract emails, URLs, numbers or hashtags from text"),
            extractors,
        })
    }

    fn target<'a>(&self, input: &'a PatternInput) -> &'a str {
        input.parameter_str("target").unwrap_or("emails")
    }
}

#[async_trait]
impl Pattern for ExtractPattern {
    fn descriptor(&self) -> &PatternDescriptor {
        &self.descriptor
    }

    fn validate(&self, input: &PatternInput) -> bool {
        !input.text.trim().is_empty() && self.extractors.contains_key(self.target(input))
    }

    async fn execute(&self, input: PatternInput) -> Result<PatternResult> {
        let start = Instant::now();
        let target = self.target(&input);
        let regex = self.extractors.get(target).ok_or_else(|| {
            PatternError::ExecutionFailed(format!("Unsupported extraction target: {}", target))
        })?;

        let mut seen = HashSet::new();
        let matches: Vec<&str> = regex
            .find_iter(&input.text)
            .map(|m| m.as_str().trim_end_matches(['.', ',', ')', ';']))
            .filter(|m| seen.insert(*m))
            .collect();

        Ok(PatternResult::success(matches.join("\n"), start.elapsed().as_secs_f64())
            .with_metadata("target", target)
            .with_metadata("count", matches.len() as i64))
    }
}

/// Re-cases text
pub struct ConvertCasePattern {
    descriptor: PatternDescriptor,
}

impl ConvertCasePattern {
    const CASES: [&'static str; 5] = ["upper", "lower", "title", "snake", "kebab"];

    pub fn new() -> Self {
        Self {
            descriptor: PatternDescriptor::new("convert_case", "Convert Case", PatternKind::Local)
                .with_description("Convert text to upper, lower, title, snake or kebab case"),
        }
    }

    fn convert(text: &str, case: &str) -> Option<String> {
        let joined = |sep: &str| {
            words(text)
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
                .join(sep)
        };

        match case {
            "upper" => Some(text.to_uppercase()),
            "lower" => Some(text.to_lowercase()),
            "title" => Some(
                text.split_whitespace()
                    .map(|word| {
                        let mut chars = word.chars();
                        match chars.next() {
                            Some(first) => {
                                first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                            }
                            None => String::new(),
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            "snake" => Some(joined("_")),
            "kebab" => Some(joined("-")),
            _ => None,
        }
    }
}

impl Default for ConvertCasePattern {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Pattern for ConvertCasePattern {
    fn descriptor(&self) -> &PatternDescriptor {
        &self.descriptor
    }

    fn validate(&self, input: &PatternInput) -> bool {
        !input.text.is_empty()
            && input
                .parameter_str("case")
                .map(|case| Self::CASES.contains(&case))
                .unwrap_or(false)
    }

    async fn execute(&self, input: PatternInput) -> Result<PatternResult> {
        let start = Instant::now();
        let case = input.parameter_str("case").unwrap_or_default();
        let output = Self::convert(&input.text, case).ok_or_else(|| {
            PatternError::ExecutionFailed(format!("Unsupported case: {}", case))
        })?;

        Ok(PatternResult::success(output, start.elapsed().as_secs_f64()).with_metadata("case", case))
    }
}
