//! Text formats for rule and seed files.
//!
//! Rule file: one line per gene, the last line holding the birth rules.
//! Each line is `rule || rule || ...` where a rule is `[tokens]radius`:
//! - `3` requires gene 3
//! - `not(3)` forbids gene 3
//! - `n(3)` requires exactly 3 living neighbors
//!
//! The radius is optional and defaults to 1.
//!
//! Seed file: one cell per line, `x;y;[genes]`, e.g. `1;2;[0,3]`.
//!
//! In both files blank lines and lines starting with `#` are skipped; errors
//! report 1-based line numbers of the source text.

use std::path::Path;

use super::engine::SeedCell;
use super::error::{HexLifeError, Result};
use super::rules::{AndRule, RuleSet, RuleTarget};

const DEFAULT_DIFFUSION_RADIUS: usize = 1;

/// Non-blank, non-comment lines with their 1-based line numbers.
fn content_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| HexLifeError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Value of `prefix(<int>)`, if `token` has that shape.
fn call_arg<'a>(token: &'a str, prefix: &str) -> Option<&'a str> {
    token
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
}

/// Parse a single `[tokens]radius` rule.
pub fn parse_and_rule(text: &str, target: RuleTarget, line: usize) -> Result<AndRule> {
    let rule = text.trim();
    let malformed = || HexLifeError::MalformedRule {
        line,
        rule: rule.to_string(),
    };

    let body = rule.strip_prefix('[').ok_or_else(malformed)?;
    let close = body.rfind(']').ok_or_else(malformed)?;
    let (content, radius) = (&body[..close], &body[close + 1..]);

    if !radius.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let diffusion_radius = if radius.is_empty() {
        DEFAULT_DIFFUSION_RADIUS
    } else {
        radius.parse().map_err(|_| malformed())?
    };

    let mut parsed = AndRule::new(target).radius(diffusion_radius);
    if content.trim().is_empty() {
        return Ok(parsed);
    }

    for token in content.split(',').map(str::trim) {
        let invalid = || HexLifeError::InvalidToken {
            line,
            token: token.to_string(),
            rule: rule.to_string(),
        };
        if let Some(arg) = call_arg(token, "not") {
            parsed.negative_genes.push(arg.parse().map_err(|_| invalid())?);
        } else if let Some(arg) = call_arg(token, "n") {
            parsed.required_neighbor_count = Some(arg.parse().map_err(|_| invalid())?);
        } else if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            parsed.positive_genes.push(token.parse().map_err(|_| invalid())?);
        } else {
            return Err(invalid());
        }
    }
    Ok(parsed)
}

/// Parse a `rule || rule || ...` line.
pub fn parse_rule_line(text: &str, target: RuleTarget, line: usize) -> Result<Vec<AndRule>> {
    text.split("||")
        .map(|rule| parse_and_rule(rule, target, line))
        .collect()
}

/// Parse a whole rule file. An empty file yields an empty rule set.
pub fn parse_rules(source: &str) -> Result<RuleSet> {
    let lines = content_lines(source)
        .map(|(line, text)| parse_rule_line(text, RuleTarget::Birth, line))
        .collect::<Result<Vec<_>>>()?;
    Ok(RuleSet::from_lines(lines))
}

pub fn read_rules_file(path: impl AsRef<Path>) -> Result<RuleSet> {
    parse_rules(&read_to_string(path.as_ref())?)
}

fn parse_gene_list(text: &str) -> Option<Vec<usize>> {
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?.trim();
    if inner.is_empty() {
        return Some(Vec::new());
    }
    inner
        .split(',')
        .map(|gene| gene.trim().parse().ok())
        .collect()
}

/// Parse one `x;y;[genes]` seed line.
pub fn parse_seed(text: &str, line: usize) -> Result<SeedCell> {
    let malformed = |reason| HexLifeError::MalformedSeed {
        line,
        text: text.trim().to_string(),
        reason,
    };
    let fields: Vec<&str> = text.trim().split(';').collect();
    let [x, y, genes] = fields.as_slice() else {
        return Err(malformed("expected three `;`-separated fields"));
    };
    let x = x
        .trim()
        .parse()
        .map_err(|_| malformed("x is not an integer"))?;
    let y = y
        .trim()
        .parse()
        .map_err(|_| malformed("y is not an integer"))?;
    let active_genes =
        parse_gene_list(genes).ok_or_else(|| malformed("genes must be a list like [0,3]"))?;
    Ok(SeedCell { x, y, active_genes })
}

pub fn parse_seeds(source: &str) -> Result<Vec<SeedCell>> {
    content_lines(source)
        .map(|(line, text)| parse_seed(text, line))
        .collect()
}

pub fn read_seeds_file(path: impl AsRef<Path>) -> Result<Vec<SeedCell>> {
    parse_seeds(&read_to_string(path.as_ref())?)
}

#[cfg(test)]
mod tests {
    use super::{parse_and_rule, parse_rule_line, parse_rules, parse_seed, parse_seeds};
    use crate::hexlife::error::HexLifeError;
    use crate::hexlife::rules::RuleTarget;

    #[test]
    fn full_rule_round_trip() {
        let rule = parse_and_rule("[1,2,not(3),n(6)]7", RuleTarget::Gene(0), 1).unwrap();
        assert_eq!(rule.positive_genes, vec![1, 2]);
        assert_eq!(rule.negative_genes, vec![3]);
        assert_eq!(rule.required_neighbor_count, Some(6));
        assert_eq!(rule.diffusion_radius, 7);
        assert_eq!(rule.target, RuleTarget::Gene(0));
    }

    #[test]
    fn radius_defaults_to_one() {
        let rule = parse_and_rule("[n(1)]", RuleTarget::Birth, 1).unwrap();
        assert_eq!(rule.required_neighbor_count, Some(1));
        assert_eq!(rule.diffusion_radius, 1);
        assert!(rule.positive_genes.is_empty());
    }

    #[test]
    fn empty_brackets_and_whitespace() {
        let rule = parse_and_rule("  [ ]0 ", RuleTarget::Birth, 1).unwrap();
        assert_eq!(rule.diffusion_radius, 0);
        let rule = parse_and_rule("[ 4 , not( 2 ) ]3", RuleTarget::Birth, 1).unwrap();
        assert_eq!(rule.positive_genes, vec![4]);
        assert_eq!(rule.negative_genes, vec![2]);
    }

    #[test]
    fn last_neighbor_gate_wins() {
        let rule = parse_and_rule("[n(2),n(5)]", RuleTarget::Birth, 1).unwrap();
        assert_eq!(rule.required_neighbor_count, Some(5));
    }

    #[test]
    fn alternatives_split_on_double_bar() {
        let rules = parse_rule_line(
            "[1,2,not(3),n(6),4,not(1)]7 || [1,n(2)]5",
            RuleTarget::Gene(1),
            4,
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].positive_genes, vec![1, 2, 4]);
        assert_eq!(rules[0].negative_genes, vec![3, 1]);
        assert_eq!(rules[1].required_neighbor_count, Some(2));
        assert_eq!(rules[1].diffusion_radius, 5);
    }

    #[test]
    fn malformed_rules_report_line() {
        for text in ["1,2]3", "[1,2", "[1]x", "[1]2 3", ""] {
            match parse_and_rule(text, RuleTarget::Birth, 9) {
                Err(HexLifeError::MalformedRule { line: 9, .. }) => {}
                other => panic!("{text:?}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_tokens_are_named() {
        for (text, bad) in [
            ("[1,foo]", "foo"),
            ("[not(x)]", "not(x)"),
            ("[n(-1)]", "n(-1)"),
            ("[1,,2]", ""),
            ("[-3]", "-3"),
        ] {
            match parse_and_rule(text, RuleTarget::Birth, 2) {
                Err(HexLifeError::InvalidToken { line: 2, token, .. }) => assert_eq!(token, bad),
                other => panic!("{text:?}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn rule_file_skips_comments_and_splits_birth_line() {
        let source = "# genes\n[0]2\n\n[1] || [not(0)]0\n# birth\n[n(2)]\n";
        let set = parse_rules(source).unwrap();
        assert_eq!(set.gene_lines(), 2);
        assert_eq!(set.gene_rules().len(), 3);
        assert_eq!(set.gene_rules()[0].target, RuleTarget::Gene(0));
        assert_eq!(set.gene_rules()[1].target, RuleTarget::Gene(1));
        assert_eq!(set.gene_rules()[2].target, RuleTarget::Gene(1));
        assert_eq!(set.alive_rules().len(), 1);
        assert_eq!(set.alive_rules()[0].target, RuleTarget::Birth);
    }

    #[test]
    fn rule_file_errors_use_source_line_numbers() {
        let source = "# header\n[0]\n\n[0,bad]\n[n(1)]";
        match parse_rules(source) {
            Err(HexLifeError::InvalidToken { line: 4, .. }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_rule_file_is_empty_set() {
        let set = parse_rules("# nothing\n\n").unwrap();
        assert!(set.is_empty());
        assert_eq!(set.gene_lines(), 0);
    }

    #[test]
    fn seeds_parse_with_whitespace_and_empty_lists() {
        let seeds = parse_seeds("1;2;[0,3]\n# comment\n -4 ; 7 ; [ ]\n").unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!((seeds[0].x, seeds[0].y), (1, 2));
        assert_eq!(seeds[0].active_genes, vec![0, 3]);
        assert_eq!((seeds[1].x, seeds[1].y), (-4, 7));
        assert!(seeds[1].active_genes.is_empty());
    }

    #[test]
    fn malformed_seeds_are_rejected() {
        for text in ["1;2", "a;2;[0]", "1;b;[0]", "1;2;0", "1;2;[0,x]", "1;2;[0];"] {
            match parse_seed(text, 3) {
                Err(HexLifeError::MalformedSeed { line: 3, .. }) => {}
                other => panic!("{text:?}: unexpected {other:?}"),
            }
        }
    }
}
