//! Turning a graded study set into page prose.

use std::fmt::Write as _;
use std::sync::Arc;

use pep_core::{EvidenceGrade, Section, Study, Usage, citation};
use pep_llm::{GenerationRequest, TextGenerator};
use serde::{Deserialize, Serialize};

use crate::error::SynthesisError;
use crate::parse::{parse_synthesis, strip_tags};

pub const DEFAULT_MAX_TOKENS: u32 = 8192;
const PLAIN_SUMMARY_MAX_TOKENS: u32 = 400;
const ABSTRACT_PROMPT_CHARS: usize = 1200;

pub const SYSTEM_PROMPT: &str = "You write neutral, evidence-based reference pages about \
research peptides for an educational website.

Rules:
- Cite every empirical claim inline with the study token exactly as given, e.g. [PMID:12345678] or [NCT:NCT01234567]. Never invent tokens.
- Cite every study you are given at least once.
- Keep human evidence and animal or laboratory evidence in separate sections.
- Use neutral, descriptive language. Report what studies did and found. Never recommend, prescribe, or suggest doses, protocols, sources, or vendors.
- Surface safety uncertainties and gaps in the evidence.
- Output HTML only, using <h2>, <p>, <ul>, <li>, <strong> and <em>. Start with a one-paragraph summary, then one <h2> per section.";

const PLAIN_SUMMARY_SYSTEM: &str = "You rewrite technical research summaries for a general \
audience. Answer with 2-3 plain sentences, no markup, no citations, no advice.";

/// Generated page content and what it cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    pub summary_html: String,
    pub sections: Vec<Section>,
    pub usage: Usage,
}

/// Summarizes studies through an injected [`TextGenerator`].
pub struct Synthesizer {
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
}

impl Synthesizer {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Generate summary and sections for one peptide.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::Generation`] when the capability fails and
    /// [`SynthesisError::Unusable`] when its output has no content.
    pub async fn synthesize(
        &self,
        name: &str,
        aliases: &[String],
        studies: &[Study],
        grade: EvidenceGrade,
    ) -> Result<Synthesis, SynthesisError> {
        let prompt = build_prompt(name, aliases, studies, grade);
        let request = GenerationRequest::new(SYSTEM_PROMPT, prompt, self.max_tokens);

        let generation = self
            .generator
            .generate(&request)
            .await
            .map_err(|source| SynthesisError::Generation {
                peptide: name.to_string(),
                source,
            })?;

        let Some(parsed) = parse_synthesis(&generation.text) else {
            return Err(SynthesisError::Unusable {
                peptide: name.to_string(),
                reason: "output contained no content".into(),
                raw_output: generation.text,
            });
        };

        tracing::info!(
            peptide = name,
            sections = parsed.sections.len(),
            input_tokens = generation.usage.input_tokens,
            output_tokens = generation.usage.output_tokens,
            "synthesis complete"
        );

        Ok(Synthesis {
            summary_html: parsed.summary_html,
            sections: parsed.sections,
            usage: generation.usage,
        })
    }

    /// Ask for a short lay summary of every section.
    ///
    /// Failures are logged and leave `plain_summary` as `None`; they never
    /// fail the page. Returns the tokens spent.
    pub async fn add_plain_language_summaries(&self, sections: &mut [Section]) -> Usage {
        let mut usage = Usage::default();
        for section in sections.iter_mut() {
            let prompt = format!(
                "Section: {}\n\n{}",
                section.title,
                strip_citations(&strip_tags(&section.content_html))
            );
            let request =
                GenerationRequest::new(PLAIN_SUMMARY_SYSTEM, prompt, PLAIN_SUMMARY_MAX_TOKENS);
            match self.generator.generate(&request).await {
                Ok(generation) => {
                    usage += generation.usage;
                    let text = strip_tags(&generation.text);
                    if !text.is_empty() {
                        section.plain_summary = Some(text);
                    }
                }
                Err(e) => {
                    tracing::warn!(section = %section.title, %e, "plain-language summary failed");
                }
            }
        }
        usage
    }
}

/// User prompt listing every study with its citation token.
#[must_use]
pub fn build_prompt(
    name: &str,
    aliases: &[String],
    studies: &[Study],
    grade: EvidenceGrade,
) -> String {
    let mut prompt = format!("Peptide: {name}\n");
    if !aliases.is_empty() {
        let _ = writeln!(prompt, "Also known as: {}", aliases.join(", "));
    }
    let _ = writeln!(prompt, "Evidence grade: {}", grade.label());
    let _ = writeln!(prompt, "Studies ({}):\n", studies.len());

    for study in studies {
        let year = study
            .year()
            .map_or_else(|| "n.d.".to_string(), |y| y.to_string());
        let _ = writeln!(
            prompt,
            "{} {} ({year}): {}",
            citation::token_for(study.id()),
            study.design().label(),
            study.title()
        );
        match study {
            Study::Literature(article) => {
                if let Some(text) = article.abstract_text.as_deref() {
                    let _ = writeln!(prompt, "  Abstract: {}", truncate(text, ABSTRACT_PROMPT_CHARS));
                }
            }
            Study::Trial(trial) => {
                let _ = writeln!(
                    prompt,
                    "  Status: {}; Conditions: {}; Interventions: {}",
                    trial.status,
                    trial.conditions.join(", "),
                    trial.interventions.join(", ")
                );
            }
        }
    }
    prompt.push_str("\nWrite the page now.");
    prompt
}

fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn strip_citations(text: &str) -> String {
    citation::CITATION_RE
        .replace_all(text, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
