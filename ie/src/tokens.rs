//! Token classification of recognized identifier lines.
//!
//! Every whitespace-separated token is classified as a set-code candidate, a
//! collector-number candidate, or neither. When a kind has several candidates,
//! a [`CandidatePolicy`] picks one.

use std::sync::LazyLock;

use catalog::ParsedIdentifier;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    SetCode,
    CollectorNumber,
}

/// A classified token and where it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub kind: TokenKind,
    /// Normalized token text (collector numbers lose any `/total` suffix).
    pub text: String,
    pub line: usize,
    pub token: usize,
}

/// How to choose between several candidates of the same kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CandidatePolicy {
    /// The last candidate in reading order wins.
    #[default]
    LastWins,
    /// The first candidate in reading order wins.
    FirstWins,
    /// Highest heuristic score wins; ties go to the later candidate.
    Scored,
}

/// Classify a single token.
///
/// 3 or 4 uppercase ASCII letters is a set code. Otherwise, an alphanumeric
/// token (a `/` is allowed) containing at least one digit is a collector number.
pub fn classify_token(token: &str) -> Option<TokenKind> {
    let len = token.chars().count();
    if (len == 3 || len == 4) && token.chars().all(|c| c.is_ascii_uppercase()) {
        return Some(TokenKind::SetCode);
    }

    let stripped = token.replace('/', "");
    if !stripped.is_empty()
        && stripped.chars().all(|c| c.is_ascii_alphanumeric())
        && stripped.chars().any(|c| c.is_ascii_digit())
    {
        return Some(TokenKind::CollectorNumber);
    }

    None
}

/// Collector numbers are printed as `number/total`; only the number is a catalog key.
fn normalize_collector_number(token: &str) -> String {
    token
        .split('/')
        .find(|part| !part.is_empty())
        .unwrap_or(token)
        .to_string()
}

/// All candidates in reading order (line, then token).
pub fn candidates<S: AsRef<str>>(lines: &[S]) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        for (token_idx, token) in line.as_ref().split_whitespace().enumerate() {
            let Some(kind) = classify_token(token) else {
                continue;
            };
            let text = match kind {
                TokenKind::SetCode => token.to_string(),
                TokenKind::CollectorNumber => normalize_collector_number(token),
            };
            out.push(Candidate {
                kind,
                text,
                line: line_idx,
                token: token_idx,
            });
        }
    }
    out
}

/// Parse recognized lines into a set code and collector number.
pub fn classify<S: AsRef<str>>(lines: &[S], policy: CandidatePolicy) -> ParsedIdentifier {
    let all = candidates(lines);
    let of_kind = |kind| all.iter().filter(move |c| c.kind == kind);

    let (set_code, collector_number) = match policy {
        CandidatePolicy::LastWins => (
            of_kind(TokenKind::SetCode).last(),
            of_kind(TokenKind::CollectorNumber).last(),
        ),
        CandidatePolicy::FirstWins => (
            of_kind(TokenKind::SetCode).next(),
            of_kind(TokenKind::CollectorNumber).next(),
        ),
        CandidatePolicy::Scored => (
            best_scored(of_kind(TokenKind::SetCode), |c| set_code_score(c, &all)),
            best_scored(of_kind(TokenKind::CollectorNumber), collector_number_score),
        ),
    };

    ParsedIdentifier {
        set_code: set_code.map(|c| c.text.clone()),
        collector_number: collector_number.map(|c| c.text.clone()),
    }
}

fn best_scored<'a>(
    candidates: impl Iterator<Item = &'a Candidate>,
    score: impl Fn(&Candidate) -> u32,
) -> Option<&'a Candidate> {
    let mut best: Option<(&Candidate, u32)> = None;
    for c in candidates {
        let s = score(c);
        match best {
            Some((_, best_s)) if s < best_s => {}
            _ => best = Some((c, s)),
        }
    }
    best.map(|(c, _)| c)
}

/// A set code printed next to a collector number is more likely to be real.
fn set_code_score(candidate: &Candidate, all: &[Candidate]) -> u32 {
    let paired = all
        .iter()
        .any(|c| c.kind == TokenKind::CollectorNumber && c.line == candidate.line);
    if paired { 1 } else { 0 }
}

/// Printed collector numbers are digits with an optional letter suffix.
/// Other tokens rank by how many digits they have (in tenths).
fn collector_number_score(candidate: &Candidate) -> u32 {
    static SHAPE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\d{1,4}[A-Z]?$").expect("regex"));

    if SHAPE.is_match(&candidate.text) {
        return 10;
    }
    let total = candidate.text.chars().count().max(1) as u32;
    let digits = candidate.text.chars().filter(|c| c.is_ascii_digit()).count() as u32;
    digits * 9 / total
}
