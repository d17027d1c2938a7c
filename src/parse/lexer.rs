use crate::common::{Int, Sign, UInt};
use crate::grade::TestSpec;
use crate::ops::{DropKeep, DropKeepKind, Edge, Explode, Threshold, ThresholdEdge};
use logos::Logos;

/// One lexed token. Concatenating the `raw` fields of a token sequence
/// reconstructs the input exactly; nothing is skipped or dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    pub position: usize,
}

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum TokenKind {
    #[regex(r"[-+]?[ \t]*[0-9]*[ \t]*d[0-9]+(![0-9]+(,[0-9]+)*)?", |lex| parse_dice(lex.slice()))]
    Dice(DiceLit),

    #[regex(r"(dl|dh|kl|kh)[ \t]*[0-9]*", |lex| parse_drop_keep(lex.slice()))]
    DropKeep(DropKeep),

    #[regex(r"x[ \t]*(>=|<=|=|>|<)?[ \t]*[0-9]*", |lex| parse_explode(lex.slice()))]
    Explode(Explode),

    #[regex(r"(bt|tt)[ \t]*[0-9]+", |lex| parse_threshold(lex.slice()))]
    Threshold(Threshold),

    #[regex(r"(eq|gte|lteq|lte|gt|lt|>=|<=|=|>|<)[ \t]*(\|\|[0-9]+\|\||[0-9]+)", |lex| parse_test(lex.slice()))]
    Test(TestSpec),

    #[regex(r"[-+][ \t]*[0-9]+", |lex| parse_modifier(lex.slice()))]
    Mod(Modifier),

    // Anything no structured pattern claims, one run at a time.
    #[error]
    Description,
}

/// Raw payload of a `dice` token. `count` of 0 with nonzero sides means a
/// bare `dY`; the builder coerces that to a single die at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DiceLit {
    pub sign: Option<Sign>,
    pub count: UInt,
    pub sides: UInt,
    pub fixed: Vec<Int>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Modifier {
    pub sign: Sign,
    pub value: UInt,
}

impl Modifier {
    pub fn signed(&self) -> Int {
        self.sign.apply(self.value as Int)
    }
}

/// Lexes `input` into a total token sequence: consecutive unmatched runs are
/// merged into single `Description` tokens.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lex = TokenKind::lexer(input);
    let mut tokens: Vec<Token> = Vec::new();
    while let Some(kind) = lex.next() {
        let raw = lex.slice();
        let position = lex.span().start;

        // A structured token glued to trailing word characters is part of a
        // word (the `x` in `max(`), not dice notation: demote it.
        let glued = matches!(
            tokens.last(),
            Some(prev) if prev.kind == TokenKind::Description
                && prev.raw.chars().last().map_or(false, |c| c.is_ascii_alphanumeric())
        );
        let kind = if glued { TokenKind::Description } else { kind };

        if kind == TokenKind::Description {
            if let Some(last) = tokens.last_mut() {
                if last.kind == TokenKind::Description {
                    last.raw.push_str(raw);
                    continue;
                }
            }
        }
        tokens.push(Token {
            kind,
            raw: raw.to_string(),
            position,
        });
    }
    tokens
}

fn strip_space(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

// `unwrap`-free even though logos has validated the shape: callbacks return
// Option, and a None demotes the slice to a description token.
fn parse_dice(slice: &str) -> Option<DiceLit> {
    let s = strip_space(slice);
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (Some(Sign::Plus), &s[1..]),
        Some(b'-') => (Some(Sign::Minus), &s[1..]),
        _ => (None, s.as_str()),
    };
    let (count, rest) = rest.split_once('d')?;
    let count = if count.is_empty() {
        0
    } else {
        count.parse().ok()?
    };
    let (sides, fixed) = match rest.split_once('!') {
        Some((sides, fixed)) => {
            let fixed = fixed
                .split(',')
                .map(str::parse)
                .collect::<Result<Vec<Int>, _>>()
                .ok()?;
            (sides, fixed)
        }
        None => (rest, Vec::new()),
    };
    Some(DiceLit {
        sign,
        count,
        sides: sides.parse().ok()?,
        fixed,
    })
}

fn parse_drop_keep(slice: &str) -> Option<DropKeep> {
    let s = strip_space(slice);
    let (kind, edge) = match s.get(..2)? {
        "dl" => (DropKeepKind::Drop, Edge::Lowest),
        "dh" => (DropKeepKind::Drop, Edge::Highest),
        "kl" => (DropKeepKind::Keep, Edge::Lowest),
        "kh" => (DropKeepKind::Keep, Edge::Highest),
        _ => return None,
    };
    let count = if s.len() > 2 { s[2..].parse().ok()? } else { 1 };
    Some(DropKeep::new(kind, edge, count))
}

fn parse_explode(slice: &str) -> Option<Explode> {
    let s = strip_space(slice);
    let rest = s.strip_prefix('x')?;
    let (cmp, rest) = split_compare(rest);
    let threshold = if rest.is_empty() {
        None
    } else {
        Some(rest.parse().ok()?)
    };
    Some(Explode::new(
        cmp.unwrap_or(crate::common::Compare::Eq),
        threshold,
    ))
}

fn parse_threshold(slice: &str) -> Option<Threshold> {
    let s = strip_space(slice);
    let edge = match s.get(..2)? {
        "bt" => ThresholdEdge::Bottom,
        "tt" => ThresholdEdge::Top,
        _ => return None,
    };
    Some(Threshold {
        edge,
        value: s[2..].parse().ok()?,
    })
}

fn parse_test(slice: &str) -> Option<TestSpec> {
    let s = strip_space(slice);
    let (cmp, rest) = split_compare(&s);
    let cmp = cmp?;
    if let Some(inner) = rest.strip_prefix("||").and_then(|r| r.strip_suffix("||")) {
        Some(TestSpec::hidden(cmp, inner.parse().ok()?))
    } else {
        Some(TestSpec::new(cmp, rest.parse().ok()?))
    }
}

fn parse_modifier(slice: &str) -> Option<Modifier> {
    let s = strip_space(slice);
    let sign = match s.as_bytes().first()? {
        b'+' => Sign::Plus,
        b'-' => Sign::Minus,
        _ => return None,
    };
    Some(Modifier {
        sign,
        value: s[1..].parse().ok()?,
    })
}

// Longest alias first so `gte` is not read as `gt`.
const COMPARE_ALIASES: &[(&str, crate::common::Compare)] = &[
    ("lteq", crate::common::Compare::Lte),
    ("gte", crate::common::Compare::Gte),
    ("lte", crate::common::Compare::Lte),
    (">=", crate::common::Compare::Gte),
    ("<=", crate::common::Compare::Lte),
    ("eq", crate::common::Compare::Eq),
    ("gt", crate::common::Compare::Gt),
    ("lt", crate::common::Compare::Lt),
    (">", crate::common::Compare::Gt),
    ("<", crate::common::Compare::Lt),
    ("=", crate::common::Compare::Eq),
];

fn split_compare(s: &str) -> (Option<crate::common::Compare>, &str) {
    for (alias, cmp) in COMPARE_ALIASES {
        if let Some(rest) = s.strip_prefix(alias) {
            return (Some(*cmp), rest);
        }
    }
    (None, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Compare;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_basic_expression() {
        let tokens = tokenize("2d6+3");
        assert_eq!(tokens.len(), 2);
        assert_eq!(
            tokens[0].kind,
            TokenKind::Dice(DiceLit {
                sign: None,
                count: 2,
                sides: 6,
                fixed: vec![],
            })
        );
        assert_eq!(
            tokens[1].kind,
            TokenKind::Mod(Modifier {
                sign: Sign::Plus,
                value: 3,
            })
        );
        assert_eq!(tokens[1].position, 3);
    }

    #[test]
    fn test_tokenize_full_pipeline_string() {
        assert_eq!(
            kinds("4d6dl1+3>=15"),
            vec![
                TokenKind::Dice(DiceLit {
                    sign: None,
                    count: 4,
                    sides: 6,
                    fixed: vec![],
                }),
                TokenKind::DropKeep(DropKeep::drop_lowest(1)),
                TokenKind::Mod(Modifier {
                    sign: Sign::Plus,
                    value: 3,
                }),
                TokenKind::Test(TestSpec::new(Compare::Gte, 15)),
            ]
        );
    }

    #[test]
    fn test_tokenize_is_total() {
        for input in [
            "4d6dl1+3>=15",
            "2d6+3 fireball",
            "utter (garbage)! here",
            "  ",
            "1d20x kh2 bt2 tt19 gte 10",
        ] {
            let rebuilt: String = tokenize(input).iter().map(|t| t.raw.as_str()).collect();
            assert_eq!(rebuilt, input);
        }
    }

    #[test]
    fn test_description_runs_merge() {
        let tokens = tokenize("2d6 some long tail");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].kind, TokenKind::Description);
        assert_eq!(tokens[1].raw, " some long tail");
    }

    #[test]
    fn test_bare_die_and_signs() {
        assert_eq!(
            kinds("-d20"),
            vec![TokenKind::Dice(DiceLit {
                sign: Some(Sign::Minus),
                count: 0,
                sides: 20,
                fixed: vec![],
            })]
        );
    }

    #[test]
    fn test_fixed_rolls() {
        assert_eq!(
            kinds("3d6!4,5"),
            vec![TokenKind::Dice(DiceLit {
                sign: None,
                count: 3,
                sides: 6,
                fixed: vec![4, 5],
            })]
        );
    }

    #[test]
    fn test_explode_forms() {
        assert_eq!(
            kinds("x"),
            vec![TokenKind::Explode(Explode::default_for_die())]
        );
        assert_eq!(
            kinds("x>=5"),
            vec![TokenKind::Explode(Explode::new(Compare::Gte, Some(5)))]
        );
        assert_eq!(
            kinds("x6"),
            vec![TokenKind::Explode(Explode::new(Compare::Eq, Some(6)))]
        );
    }

    #[test]
    fn test_word_test_operators() {
        assert_eq!(
            kinds("gte15"),
            vec![TokenKind::Test(TestSpec::new(Compare::Gte, 15))]
        );
        assert_eq!(
            kinds("lteq3"),
            vec![TokenKind::Test(TestSpec::new(Compare::Lte, 3))]
        );
    }

    #[test]
    fn test_hidden_test() {
        assert_eq!(
            kinds(">=||15||"),
            vec![TokenKind::Test(TestSpec::hidden(Compare::Gte, 15))]
        );
    }

    #[test]
    fn test_word_glued_tokens_stay_description() {
        // the `x` in `max(` is part of a word, not an explode
        let tokens = tokenize("max(3,5) damage");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Description);
        assert_eq!(tokens[0].raw, "max(3,5) damage");
    }

    #[test]
    fn test_threshold_tokens() {
        assert_eq!(
            kinds("bt2tt19"),
            vec![
                TokenKind::Threshold(Threshold::bottom(2)),
                TokenKind::Threshold(Threshold::top(19)),
            ]
        );
    }
}
