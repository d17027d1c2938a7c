use super::lexer::{Token, TokenKind};
use crate::common::{Int, Sign, UInt};
use crate::grade::TestSpec;
use crate::ops::{Manipulation, SignRules};
use std::fmt;

/// One structured die-expression: everything a single roll needs.
#[derive(Debug, Clone, PartialEq)]
pub struct DicePartSpec {
    pub sign: Sign,
    pub count: UInt,
    pub sides: UInt,
    /// Consumed in order instead of rolling; random rolls resume once
    /// exhausted.
    pub fixed_rolls: Vec<Int>,
    pub manipulations: Vec<Manipulation>,
    pub test: Option<TestSpec>,
    pub modifier: Int,
    pub description: String,
}

impl Default for DicePartSpec {
    fn default() -> Self {
        Self {
            sign: Sign::Plus,
            count: 0,
            sides: 0,
            fixed_rolls: Vec::new(),
            manipulations: Vec::new(),
            test: None,
            modifier: 0,
            description: String::new(),
        }
    }
}

impl DicePartSpec {
    pub fn simple(count: UInt, sides: UInt) -> Self {
        Self {
            count: if count == 0 && sides > 0 { 1 } else { count },
            sides,
            ..Self::default()
        }
    }

    fn push_description(&mut self, raw: &str) {
        self.description.push_str(raw);
    }
}

impl DicePartSpec {
    /// Canonical expression text without the trailing description.
    pub fn expression(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        if self.sides > 0 || self.count > 0 {
            if self.sign == Sign::Minus {
                out.push('-');
            }
            let _ = write!(out, "{}d{}", self.count, self.sides);
        }
        for m in &self.manipulations {
            let _ = write!(out, "{}", m);
        }
        if self.modifier != 0 {
            let _ = write!(out, "{:+}", self.modifier);
        }
        if let Some(test) = &self.test {
            let _ = write!(out, "{}", test);
        }
        out
    }
}

impl fmt::Display for DicePartSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression())?;
        if !self.description.is_empty() {
            write!(f, " {}", self.description)?;
        }
        Ok(())
    }
}

/// Folds a token sequence into one part with the fixed reducer priority:
/// dice resets the core fields (and may synthesize a DropKeep from its
/// sign), manipulations append in encountered order, the first test wins and
/// a second one ends structured parsing, a mod sets the modifier, and
/// everything else lands in the description verbatim.
pub fn parse_dice_part(tokens: &[Token], rules: &SignRules) -> DicePartSpec {
    let mut spec = DicePartSpec::default();
    let mut structured = true;

    for tok in tokens {
        if !structured {
            spec.push_description(&tok.raw);
            continue;
        }
        match &tok.kind {
            TokenKind::Dice(d) => {
                spec.sign = d.sign.unwrap_or(Sign::Plus);
                spec.count = d.count;
                spec.sides = d.sides;
                spec.fixed_rolls = d.fixed.clone();
                if d.count == 0 && d.sides > 0 {
                    spec.count = 1;
                }
                if let Some(sign) = d.sign {
                    if let Some(dk) = rules.lookup(sign, d.sides) {
                        spec.manipulations.push(dk.into());
                        spec.sign = Sign::Plus;
                    }
                }
            }
            TokenKind::DropKeep(m) => spec.manipulations.push((*m).into()),
            TokenKind::Explode(m) => spec.manipulations.push((*m).into()),
            TokenKind::Threshold(m) => spec.manipulations.push((*m).into()),
            TokenKind::Test(t) => {
                if spec.test.is_none() {
                    spec.test = Some(*t);
                } else {
                    structured = false;
                    spec.push_description(&tok.raw);
                }
            }
            TokenKind::Mod(m) => spec.modifier = m.signed(),
            TokenKind::Description => spec.push_description(&tok.raw),
        }
    }

    spec.description = spec.description.trim().to_string();
    spec
}

/// Splits a token sequence into parts, one per dice token, and folds each.
/// `1d20+5+2d6` yields two parts: `1d20+5` and a plus-signed `2d6`.
pub fn parse_dice_parts(tokens: &[Token], rules: &SignRules) -> Vec<DicePartSpec> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut seen_dice = false;
    for (i, tok) in tokens.iter().enumerate() {
        if matches!(tok.kind, TokenKind::Dice(_)) {
            if seen_dice {
                parts.push(parse_dice_part(&tokens[start..i], rules));
                start = i;
            }
            seen_dice = true;
        }
    }
    parts.push(parse_dice_part(&tokens[start..], rules));
    parts
}
