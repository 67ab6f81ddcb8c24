//! Narsese surface syntax: turns one input line into a [`Task`] (spec.md
//! §6). Grammar: `<S --> P>`, `<S <-> P>`, `(S & T)`, `(S | T)`,
//! `(S <~> T)`, `(*, a, b, …)`, `(--, S)`, `<S ==> P>`, variables
//! `?x $x #x`, punctuation `. ? ! @ ;`, optional truth `%f;c%`.
//!
//! Angle brackets are accepted only as the outermost wrapper of a
//! statement; nested subterms use the parenthesized infix form instead
//! (`(a --> b)`, not `<a --> b>`), since [`Term`]'s own `Display` never
//! emits angle brackets either — this keeps top-level copula scanning
//! unambiguous without a full bracket-matching pass over `<`/`>`.

use crate::error::NarsError;
use crate::task::{Punctuation, Task, TaskBuilder};
use crate::term::{Op, Term, VarKind};
use crate::truth::Truth;

const COPULAS: &[(&str, Op)] = &[
    ("-->", Op::Inheritance),
    ("<->", Op::Similarity),
    ("==>", Op::Implication),
    ("<=>", Op::Equivalence),
    ("=/>", Op::ImplicationPredictive),
    ("=|>", Op::ImplicationConcurrent),
    ("=\\>", Op::ImplicationRetrospective),
    ("<~>", Op::Difference),
];

fn parse_err(reason: impl Into<String>) -> NarsError {
    NarsError::Parse { line: 1, col: 0, reason: reason.into() }
}

/// Parse every non-blank line of `input` into a task, stopping at the
/// first error.
pub fn parse(input: &str) -> Result<Vec<Task>, NarsError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(i + 1, line))
        .collect()
}

/// Parse one Narsese line into a [`Task`], reporting `line_no` in any
/// [`NarsError::Parse`].
pub fn parse_line(line_no: usize, input: &str) -> Result<Task, NarsError> {
    let with_line = |reason: String| NarsError::Parse { line: line_no, col: 0, reason };
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(with_line("empty input".into()));
    }

    let (body, truth_str) = split_truth(trimmed);
    let body = body.trim_end();
    let Some(punct_char) = body.chars().last() else {
        return Err(with_line("missing punctuation".into()));
    };
    let punctuation = match punct_char {
        '.' => Punctuation::Belief,
        '!' => Punctuation::Goal,
        '?' => Punctuation::Question,
        '@' => Punctuation::Quest,
        ';' => Punctuation::Command,
        _ => return Err(with_line(format!("expected punctuation '.', '?', '!', '@', or ';', found '{punct_char}'"))),
    };
    let term_str = body[..body.len() - punct_char.len_utf8()].trim();
    if term_str.is_empty() {
        return Err(with_line("missing term".into()));
    }

    let term = parse_term(term_str).map_err(|e| match e {
        NarsError::Parse { reason, .. } => with_line(reason),
        other => other,
    })?;

    let truth = match truth_str {
        Some(raw) => Some(parse_truth(raw).map_err(|e| match e {
            NarsError::Parse { reason, .. } => with_line(reason),
            other => other,
        })?),
        None => match punctuation {
            Punctuation::Belief => Some(Truth::default_belief()),
            Punctuation::Goal => Some(Truth::default_goal()),
            _ => None,
        },
    };
    if truth.is_some() && matches!(punctuation, Punctuation::Question | Punctuation::Quest | Punctuation::Command) {
        return Err(with_line("questions, quests, and commands do not carry truth values".into()));
    }

    let mut builder = TaskBuilder::new().term(term).punctuation(punctuation);
    if let Some(truth) = truth {
        builder = builder.truth(truth);
    }
    builder.build().map_err(|e| with_line(e.to_string()))
}

/// Split off a trailing `%f;c%` token, if present.
fn split_truth(input: &str) -> (&str, Option<&str>) {
    if let Some(idx) = input.rfind(char::is_whitespace) {
        let (rest, last) = input.split_at(idx);
        let last = last.trim();
        if last.len() > 2 && last.starts_with('%') && last.ends_with('%') {
            return (rest, Some(last));
        }
    }
    (input, None)
}

fn parse_truth(raw: &str) -> Result<Truth, NarsError> {
    let inner = &raw[1..raw.len() - 1];
    let (f, c) = inner
        .split_once(';')
        .ok_or_else(|| parse_err(format!("malformed truth value '{raw}', expected '%f;c%'")))?;
    let f: f32 = f.trim().parse().map_err(|_| parse_err(format!("invalid frequency '{f}'")))?;
    let c: f32 = c.trim().parse().map_err(|_| parse_err(format!("invalid confidence '{c}'")))?;
    Ok(Truth::new(f, c))
}

/// Parse one term, stripping a single outer bracket pair (`<...>` or
/// `(...)`) if present.
pub fn parse_term(input: &str) -> Result<Term, NarsError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(parse_err("empty term"));
    }
    if s.len() >= 2 && s.starts_with('<') && s.ends_with('>') {
        return parse_bracketed(&s[1..s.len() - 1]);
    }
    if s.len() >= 2 && s.starts_with('(') && s.ends_with(')') {
        return parse_bracketed(&s[1..s.len() - 1]);
    }
    if let Some(rest) = s.strip_prefix('$') {
        return validate_name(rest).map(|n| Term::variable(VarKind::Independent, n));
    }
    if let Some(rest) = s.strip_prefix('#') {
        return validate_name(rest).map(|n| Term::variable(VarKind::Dependent, n));
    }
    if let Some(rest) = s.strip_prefix('?') {
        return validate_name(rest).map(|n| Term::variable(VarKind::Query, n));
    }
    validate_name(s).map(Term::atom)
}

fn validate_name(s: &str) -> Result<&str, NarsError> {
    if s.is_empty() {
        return Err(parse_err("empty atom/variable name"));
    }
    if s.chars().any(|c| "()<>,%;.?!@".contains(c) || c.is_whitespace()) {
        return Err(parse_err(format!("invalid character in name '{s}'")));
    }
    Ok(s)
}

/// Parse the contents of a single outer bracket pair (already stripped).
fn parse_bracketed(inner: &str) -> Result<Term, NarsError> {
    let inner = inner.trim();
    if let Some(rest) = inner.strip_prefix("--,") {
        return Term::compound(Op::Negation, vec![parse_term(rest)?]).map_err(|e| parse_err(e.to_string()));
    }
    if let Some(rest) = inner.strip_prefix("*,") {
        let args = split_top_level_commas(rest)?;
        let components = args.iter().map(|a| parse_term(a)).collect::<Result<Vec<_>, _>>()?;
        return Term::compound(Op::Product, components).map_err(|e| parse_err(e.to_string()));
    }
    if let Some(rest) = inner.strip_prefix("/,") {
        let args = split_top_level_commas(rest)?;
        let components = args.iter().map(|a| parse_term(a)).collect::<Result<Vec<_>, _>>()?;
        return Term::compound(Op::ImageExt, components).map_err(|e| parse_err(e.to_string()));
    }
    if let Some(rest) = inner.strip_prefix("\\,") {
        let args = split_top_level_commas(rest)?;
        let components = args.iter().map(|a| parse_term(a)).collect::<Result<Vec<_>, _>>()?;
        return Term::compound(Op::ImageInt, components).map_err(|e| parse_err(e.to_string()));
    }
    if let Some(rest) = inner.strip_prefix("&,") {
        let args = split_top_level_commas(rest)?;
        let components = args.iter().map(|a| parse_term(a)).collect::<Result<Vec<_>, _>>()?;
        return Term::compound(Op::Conjunction, components).map_err(|e| parse_err(e.to_string()));
    }
    if let Some(rest) = inner.strip_prefix("|,") {
        let args = split_top_level_commas(rest)?;
        let components = args.iter().map(|a| parse_term(a)).collect::<Result<Vec<_>, _>>()?;
        return Term::compound(Op::Disjunction, components).map_err(|e| parse_err(e.to_string()));
    }

    if let Some((left, op, right)) = find_top_level_copula(inner) {
        let subject = parse_term(left)?;
        let predicate = parse_term(right)?;
        return Term::compound(op, vec![subject, predicate]).map_err(|e| parse_err(e.to_string()));
    }

    if let Some(operands) = split_top_level_infix_chain(inner, '&') {
        let components = operands.iter().map(|o| parse_term(o)).collect::<Result<Vec<_>, _>>()?;
        return Term::compound(Op::Conjunction, components).map_err(|e| parse_err(e.to_string()));
    }
    if let Some(operands) = split_top_level_infix_chain(inner, '|') {
        let components = operands.iter().map(|o| parse_term(o)).collect::<Result<Vec<_>, _>>()?;
        return Term::compound(Op::Disjunction, components).map_err(|e| parse_err(e.to_string()));
    }

    Err(parse_err(format!("unrecognized compound form '({inner})'")))
}

/// Depth (via `(`/`)` only, per this module's nesting convention) at each
/// char offset of `s`, for top-level scans.
fn depths(s: &str) -> Vec<i32> {
    let mut depth = 0i32;
    let mut out = Vec::with_capacity(s.len());
    for ch in s.chars() {
        if ch == '(' {
            depth += 1;
        }
        out.push(depth);
        if ch == ')' {
            depth -= 1;
        }
    }
    out
}

fn find_top_level_copula(s: &str) -> Option<(&str, Op, &str)> {
    let chars: Vec<char> = s.chars().collect();
    let depth = depths(s);
    for i in 0..chars.len() {
        if depth[i] != 0 {
            continue;
        }
        for (token, op) in COPULAS {
            let token_chars: Vec<char> = token.chars().collect();
            if i + token_chars.len() <= chars.len() && chars[i..i + token_chars.len()] == token_chars[..] {
                if let Some(split) = slice_copula(s, i, token_chars.len(), *op) {
                    return Some(split);
                }
            }
        }
    }
    None
}

/// Re-derive the byte-offset split for a copula match at char index
/// `char_idx`, since the scan above works in chars but callers want
/// plain `&str` slices.
fn slice_copula(s: &str, char_idx: usize, token_len: usize, op: Op) -> Option<(&str, Op, &str)> {
    let byte_idx = s.char_indices().nth(char_idx).map(|(b, _)| b)?;
    let token_str: String = s[byte_idx..].chars().take(token_len).collect();
    let token_byte_len = token_str.len();
    let left = s[..byte_idx].trim();
    let right = s[byte_idx + token_byte_len..].trim();
    if left.is_empty() || right.is_empty() {
        return None;
    }
    Some((left, op, right))
}

fn split_top_level_commas(s: &str) -> Result<Vec<&str>, NarsError> {
    let depth = depths(s);
    let bytes_idx: Vec<usize> = s.char_indices().map(|(b, _)| b).collect();
    let mut parts = Vec::new();
    let mut start = 0usize;
    for (i, ch) in s.chars().enumerate() {
        if ch == ',' && depth[i] == 0 {
            let end = bytes_idx[i];
            parts.push(s[start..end].trim());
            start = end + 1;
        }
    }
    parts.push(s[start..].trim());
    if parts.iter().any(|p| p.is_empty()) {
        return Err(parse_err(format!("empty operand in '({s})'")));
    }
    Ok(parts)
}

/// Split `s` on top-level occurrences of infix operator char `op_char`
/// (e.g. `&`, `|`), requiring at least two operands. Returns `None` if
/// the operator never occurs at depth 0.
fn split_top_level_infix_chain(s: &str, op_char: char) -> Option<Vec<&str>> {
    let depth = depths(s);
    let bytes_idx: Vec<usize> = s.char_indices().map(|(b, _)| b).collect();
    let chars: Vec<char> = s.chars().collect();
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut found = false;
    for i in 0..chars.len() {
        if chars[i] == op_char && depth[i] == 0 {
            found = true;
            let end = bytes_idx[i];
            parts.push(s[start..end].trim());
            start = bytes_idx.get(i + 1).copied().unwrap_or(s.len());
        }
    }
    if !found {
        return None;
    }
    parts.push(s[start..].trim());
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inheritance_with_truth() {
        let task = parse_line(1, "<man --> mortal>. %1.0;0.9%").unwrap();
        assert!(task.is_belief());
        assert_eq!(
            task.term(),
            &Term::compound(Op::Inheritance, vec![Term::atom("man"), Term::atom("mortal")]).unwrap()
        );
        let truth = task.truth().unwrap();
        assert!((truth.frequency() - 1.0).abs() < 1e-4);
        assert!((truth.confidence() - 0.9).abs() < 1e-4);
    }

    #[test]
    fn belief_without_truth_gets_default() {
        let task = parse_line(1, "<bird --> flyer>.").unwrap();
        let truth = task.truth().unwrap();
        assert!((truth.frequency() - 1.0).abs() < 1e-4);
        assert!((truth.confidence() - 0.9).abs() < 1e-4);
    }

    #[test]
    fn question_has_no_truth() {
        let task = parse_line(1, "<bird --> flyer>?").unwrap();
        assert!(task.is_question());
        assert!(task.truth().is_none());
    }

    #[test]
    fn rejects_truth_on_question() {
        let err = parse_line(1, "<bird --> flyer>? %1.0;0.9%").unwrap_err();
        assert!(matches!(err, NarsError::Parse { .. }));
    }

    #[test]
    fn parses_variables() {
        let term = parse_term("$x").unwrap();
        assert!(term.is_variable());
        let term = parse_term("?x").unwrap();
        assert_eq!(term.var_kind(), Some(VarKind::Query));
    }

    #[test]
    fn parses_product_and_negation() {
        let product = parse_term("(*, a, b)").unwrap();
        assert_eq!(product.operator(), Some(Op::Product));
        assert_eq!(product.components().len(), 2);

        let negation = parse_term("(--, rain)").unwrap();
        assert_eq!(negation.operator(), Some(Op::Negation));
    }

    #[test]
    fn parses_infix_conjunction_and_disjunction() {
        let conj = parse_term("(a & b)").unwrap();
        assert_eq!(conj.operator(), Some(Op::Conjunction));
        let disj = parse_term("(a | b)").unwrap();
        assert_eq!(disj.operator(), Some(Op::Disjunction));
    }

    #[test]
    fn parses_difference_in_parens() {
        let diff = parse_term("(a <~> b)").unwrap();
        assert_eq!(diff.operator(), Some(Op::Difference));
    }

    #[test]
    fn parses_nested_parenthesized_subject() {
        let term = parse_term("((a --> b) --> c)").unwrap();
        assert_eq!(term.operator(), Some(Op::Inheritance));
        assert_eq!(term.components()[0].operator(), Some(Op::Inheritance));
    }

    #[test]
    fn rejects_malformed_punctuation() {
        let err = parse_line(1, "<bird --> flyer>").unwrap_err();
        assert!(matches!(err, NarsError::Parse { .. }));
    }

    #[test]
    fn rejects_bad_term_arity_as_parse_error() {
        let err = parse_line(1, "<bird>.").unwrap_err();
        assert!(matches!(err, NarsError::Parse { .. }));
    }

    #[test]
    fn parse_multi_line_input() {
        let tasks = parse("<man --> mortal>. %1.0;0.9%\n<Socrates --> man>. %1.0;0.8%\n").unwrap();
        assert_eq!(tasks.len(), 2);
    }
}
