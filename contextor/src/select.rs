//! Keyword relevance selection over the paragraphs of a document.
//!
//! Given the full text, a question and a character budget, builds the excerpt
//! that goes into the prompt:
//!
//! 1. query terms: lower-cased whitespace tokens, minus stop words and tokens of
//!    two characters or fewer;
//! 2. paragraphs: blank-line separated blocks, empty ones dropped;
//! 3. score per paragraph: for each term `10 * occurrences`, plus `5` if it occurs;
//! 4. stable sort by score and greedy fill with whole paragraphs;
//! 5. when the fill stays under half the budget, the head of the document is
//!    placed in front of it, behind a divider.
//!
//! Lengths are counted in `char`s and the budget bounds the body only; the
//! diagnostic trailer is additive. Selection is pure and deterministic.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Placed between the head-of-document backfill and the scored paragraphs.
pub const DIVIDER: &str = "\n\n--- SECCIONES RELEVANTES ---\n\n";

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Short Spanish function words that never count as query terms.
const STOP_WORDS: &[&str] = &[
    "el", "la", "los", "las", "un", "una", "unos", "unas", "lo", "al", "del", "de", "en", "y",
    "o", "u", "e", "a", "que", "qué", "con", "por", "para", "sin", "sobre", "entre", "hasta",
    "desde", "hacia", "ante", "bajo", "tras", "se", "su", "sus", "es", "son", "como", "cómo",
    "cual", "cuál", "cuales", "cuáles", "cuando", "cuándo", "donde", "dónde", "quien", "quién",
    "mi", "mis", "tu", "tus", "me", "te", "le", "les", "nos", "este", "esta", "estos", "estas",
    "ese", "esa", "esos", "esas", "hay", "pero", "más", "muy", "ya", "no", "si", "sí", "puedo",
    "puede", "debo", "tiene", "tengo", "ser", "estar",
];

/// How an excerpt was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcerptKind {
    /// Scored paragraphs (possibly behind a head backfill).
    Relevant,
    /// No usable terms or no paragraph matched: head of the document.
    General,
    /// Selection failed: head of the document.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevantExcerpt {
    pub body: String,
    pub kind: ExcerptKind,
    pub query_terms: Vec<String>,
    /// Paragraphs that scored above zero.
    pub matched_sections: usize,
}

impl RelevantExcerpt {
    pub fn body_chars(&self) -> usize {
        self.body.chars().count()
    }

    /// Diagnostic line appended after the body of a scored excerpt.
    pub fn trailer(&self) -> String {
        match self.kind {
            ExcerptKind::Relevant => format!(
                "\n\n[Términos buscados: {}. Secciones relevantes encontradas: {}]",
                self.query_terms.join(", "),
                self.matched_sections
            ),
            ExcerptKind::General | ExcerptKind::Fallback => String::new(),
        }
    }

    /// Body followed by the trailer, as embedded in the prompt.
    pub fn render(&self) -> String {
        let mut out = self.body.clone();
        out.push_str(&self.trailer());
        out
    }
}

#[derive(Debug, Error)]
enum SelectError {
    #[error("budget must be greater than zero")]
    ZeroBudget,
    #[error("document has no non-empty paragraph")]
    NoParagraphs,
}

/// Builds the excerpt of `text` for `question` within `budget` characters.
pub fn select(text: &str, question: &str, budget: usize) -> RelevantExcerpt {
    let terms = query_terms(question);
    match assemble(text, &terms, budget) {
        Ok(excerpt) => {
            debug!(
                kind = ?excerpt.kind,
                terms = ?excerpt.query_terms,
                matched = excerpt.matched_sections,
                chars = excerpt.body_chars(),
                budget,
                "excerpt selected"
            );
            excerpt
        }
        Err(e) => {
            warn!(error = %e, budget, "relevance selection failed; using document head");
            RelevantExcerpt {
                body: head(text, budget).to_string(),
                kind: ExcerptKind::Fallback,
                query_terms: terms,
                matched_sections: 0,
            }
        }
    }
}

/// Lower-cased question tokens that carry meaning, in first-seen order.
///
/// Surrounding punctuation (`¿`, `?`, `,` ...) is stripped before filtering.
pub fn query_terms(question: &str) -> Vec<String> {
    let lowered = question.to_lowercase();
    let mut terms: Vec<String> = Vec::new();
    for raw in lowered.split_whitespace() {
        let tok = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if tok.chars().count() <= 2 || STOP_WORDS.contains(&tok) {
            continue;
        }
        if !terms.iter().any(|t| t == tok) {
            terms.push(tok.to_string());
        }
    }
    terms
}

/// Score of one paragraph against the query terms.
pub fn score(paragraph: &str, terms: &[String]) -> usize {
    let lowered = paragraph.to_lowercase();
    terms
        .iter()
        .map(|t| match lowered.matches(t.as_str()).count() {
            0 => 0,
            n => 10 * n + 5,
        })
        .sum()
}

/// Blank-line separated, trimmed, non-empty blocks of `text`, in order.
pub fn paragraphs(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                out.push(text[s..end].trim());
            }
        } else {
            start.get_or_insert(line_start);
            end = offset;
        }
    }
    if let Some(s) = start {
        out.push(text[s..end].trim());
    }
    out
}

/// First `max_chars` characters of `text`.
pub fn head(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn general(text: &str, budget: usize, terms: &[String]) -> RelevantExcerpt {
    RelevantExcerpt {
        body: head(text, budget).to_string(),
        kind: ExcerptKind::General,
        query_terms: terms.to_vec(),
        matched_sections: 0,
    }
}

fn assemble(text: &str, terms: &[String], budget: usize) -> Result<RelevantExcerpt, SelectError> {
    if budget == 0 {
        return Err(SelectError::ZeroBudget);
    }
    if terms.is_empty() {
        return Ok(general(text, budget, terms));
    }

    let paras = paragraphs(text);
    if paras.is_empty() {
        return Err(SelectError::NoParagraphs);
    }

    let mut scored: Vec<(usize, &str)> = paras
        .iter()
        .filter_map(|p| {
            let s = score(p, terms);
            (s > 0).then_some((s, *p))
        })
        .collect();
    if scored.is_empty() {
        return Ok(general(text, budget, terms));
    }
    let matched_sections = scored.len();

    // `sort_by` is stable: equal scores keep document order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let sep_chars = PARAGRAPH_SEPARATOR.chars().count();
    let mut picked = String::new();
    let mut used = 0usize;
    for (_, p) in &scored {
        let cost = p.chars().count() + sep_chars;
        if used + cost > budget {
            break;
        }
        picked.push_str(p);
        picked.push_str(PARAGRAPH_SEPARATOR);
        used += cost;
    }

    let body = if picked.is_empty() {
        head(text, budget).to_string()
    } else if used * 2 < budget {
        let divider_chars = DIVIDER.chars().count();
        let room = budget - used;
        if room > divider_chars {
            format!("{}{DIVIDER}{picked}", head(text, room - divider_chars))
        } else {
            picked
        }
    } else {
        picked
    };

    Ok(RelevantExcerpt {
        body,
        kind: ExcerptKind::Relevant,
        query_terms: terms.to_vec(),
        matched_sections,
    })
}
