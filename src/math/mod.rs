//! Arithmetic rewriting of free text. Each pass repeatedly locates the next
//! rewritable fragment, replaces it with its evaluated form, and stops once a
//! full scan changes nothing. Spoiler segments (`||...||`) are rewritten in
//! place without losing their bars.

mod eval;
mod registry;

use crate::common::Float;
use crate::error::MathError;
use registry::Pattern;

/// Numeric failure marker (overflow to non-finite, division by zero).
const NAN_MARKER: &str = "(NaN)";
/// Structural failure marker (malformed expression, unknown function).
const ERR_MARKER: &str = "(ERR)";

/// Upper bound on rewrite iterations per pass, so a pathological replacement
/// can never spin forever.
const MAX_PASSES: usize = 256;

/// Full rewrite: function calls, parenthesized groups with optional implicit
/// multipliers, then flat arithmetic runs, to a fixed point.
pub fn do_complex(text: &str) -> String {
    spoiler_aware(text, complex_pass)
}

/// Groups and flat runs only; named functions are left untouched.
pub fn do_simple(text: &str) -> String {
    spoiler_aware(text, simple_pass)
}

/// Collapses runs of consecutive signs (`+-3` becomes `-3`, `--3` becomes
/// `+3`). A leading `+` on the result is retained.
pub fn do_pos_neg(text: &str) -> String {
    spoiler_aware(text, pos_neg_pass)
}

fn complex_pass(text: &str) -> String {
    let mut text = text.to_string();
    for _ in 0..MAX_PASSES {
        if let Some(next) = rewrite_function(&text) {
            text = next;
        } else if let Some(next) = rewrite_group(&text) {
            text = next;
        } else if let Some(next) = rewrite_simple(&text) {
            text = next;
        } else {
            break;
        }
    }
    text
}

fn simple_pass(text: &str) -> String {
    let mut text = text.to_string();
    for _ in 0..MAX_PASSES {
        if let Some(next) = rewrite_group(&text) {
            text = next;
        } else if let Some(next) = rewrite_simple(&text) {
            text = next;
        } else {
            break;
        }
    }
    text
}

fn pos_neg_pass(text: &str) -> String {
    let mut text = text.to_string();
    let re = Pattern::SignRun.regex();
    for _ in 0..MAX_PASSES {
        let (range, replacement) = match re.find(&text) {
            None => break,
            Some(found) => {
                let run = found.as_str();
                let minus = run.chars().filter(|&c| c == '-').count();
                let number: String = run
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.')
                    .collect();
                let sign = if minus % 2 == 1 { '-' } else { '+' };
                (found.range(), format!("{}{}", sign, number))
            }
        };
        text.replace_range(range, &replacement);
    }
    text
}

/// Applies `pass` to the text around and inside each spoiler segment,
/// re-wrapping the segment contents in `||`.
fn spoiler_aware(text: &str, pass: fn(&str) -> String) -> String {
    let re = Pattern::Spoiler.regex();
    let mut out = String::new();
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let (whole, inner) = match (caps.get(0), caps.get(1)) {
            (Some(whole), Some(inner)) => (whole, inner),
            _ => continue,
        };
        out.push_str(&pass(&text[last..whole.start()]));
        out.push_str("||");
        out.push_str(&pass(inner.as_str()));
        out.push_str("||");
        last = whole.end();
    }
    out.push_str(&pass(&text[last..]));
    out
}

fn rewrite_function(text: &str) -> Option<String> {
    let caps = Pattern::FunctionCall.regex().captures(text)?;
    let whole = caps.get(0)?;
    let name = caps.get(1)?.as_str().to_ascii_lowercase();
    let raw_args = caps.get(2)?.as_str();

    let replacement = match eval_args(raw_args) {
        Ok(args) => match apply_function(&name, &args) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!(function = %name, %err, "math function failed");
                ERR_MARKER.to_string()
            }
        },
        Err(err) => {
            tracing::warn!(function = %name, %err, "bad math function arguments");
            ERR_MARKER.to_string()
        }
    };
    Some(splice(text, whole.range(), &replacement))
}

fn rewrite_group(text: &str) -> Option<String> {
    let caps = Pattern::Group.regex().captures(text)?;
    let whole = caps.get(0)?;
    let inner = caps.get(2)?.as_str();

    let replacement = match eval::eval(inner) {
        Ok(mut value) => {
            if let Some(multiplier) = caps.get(1) {
                match multiplier.as_str().parse::<Float>() {
                    Ok(m) => value *= m,
                    Err(_) => return Some(splice(text, whole.range(), ERR_MARKER)),
                }
            }
            format_number(value).unwrap_or_else(|| NAN_MARKER.to_string())
        }
        Err(err) => {
            tracing::warn!(%err, group = inner, "malformed arithmetic group");
            ERR_MARKER.to_string()
        }
    };
    Some(splice(text, whole.range(), &replacement))
}

fn rewrite_simple(text: &str) -> Option<String> {
    let whole = Pattern::SimpleRun.regex().find(text)?;
    let replacement = match eval::eval(whole.as_str()) {
        Ok(value) => format_number(value).unwrap_or_else(|| NAN_MARKER.to_string()),
        Err(err) => {
            tracing::warn!(%err, run = whole.as_str(), "malformed arithmetic run");
            ERR_MARKER.to_string()
        }
    };
    Some(splice(text, whole.range(), &replacement))
}

fn splice(text: &str, range: std::ops::Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..range.start]);
    out.push_str(replacement);
    out.push_str(&text[range.end..]);
    out
}

fn eval_args(raw: &str) -> Result<Vec<Float>, MathError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',').map(|arg| eval::eval(arg.trim())).collect()
}

fn apply_function(name: &str, args: &[Float]) -> Result<String, MathError> {
    let value = match name {
        "abs" => unary(name, args)?.abs(),
        "ceil" => unary(name, args)?.ceil(),
        "floor" => unary(name, args)?.floor(),
        "round" => unary(name, args)?.round(),
        "sign" => {
            let v = unary(name, args)?;
            if v == 0.0 {
                0.0
            } else {
                v.signum()
            }
        }
        "hypot" => match args {
            [a, b] => a.hypot(*b),
            _ => {
                return Err(MathError::WrongArity {
                    name: name.to_string(),
                    expected: 2,
                    got: args.len(),
                })
            }
        },
        "max" => fold(name, args, Float::max)?,
        "min" => fold(name, args, Float::min)?,
        "nth" => return Ok(ordinal(unary(name, args)?.round() as i64)),
        "signed" => {
            let v = unary(name, args)?;
            if !v.is_finite() {
                return Ok(NAN_MARKER.to_string());
            }
            return Ok(if v.fract() == 0.0 {
                format!("{:+}", v as i64)
            } else {
                format!("{:+}", v)
            });
        }
        _ => return Err(MathError::UnknownFunction(name.to_string())),
    };
    Ok(format_number(value).unwrap_or_else(|| NAN_MARKER.to_string()))
}

fn unary(name: &str, args: &[Float]) -> Result<Float, MathError> {
    match args {
        [v] => Ok(*v),
        _ => Err(MathError::WrongArity {
            name: name.to_string(),
            expected: 1,
            got: args.len(),
        }),
    }
}

fn fold(name: &str, args: &[Float], pick: fn(Float, Float) -> Float) -> Result<Float, MathError> {
    match args.split_first() {
        Some((first, rest)) => Ok(rest.iter().fold(*first, |acc, v| pick(acc, *v))),
        None => Err(MathError::WrongArity {
            name: name.to_string(),
            expected: 1,
            got: 0,
        }),
    }
}

/// `None` for non-finite values; integral values render without a trailing
/// `.0`.
fn format_number(value: Float) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < 9e15 {
        Some(format!("{}", value as i64))
    } else {
        Some(format!("{}", value))
    }
}

/// `1` becomes `1st`, `2` becomes `2nd`, with the usual teens exception.
fn ordinal(n: i64) -> String {
    let suffix = match (n.abs() % 10, n.abs() % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_do_simple() {
        assert_eq!(do_simple("deal 2 + 3 damage"), "deal 5 damage");
        assert_eq!(do_simple("(4 * 5)"), "20");
        assert_eq!(do_simple("no math here"), "no math here");
    }

    #[test]
    fn test_do_complex_functions() {
        assert_eq!(do_complex("max(3,5) damage"), "5 damage");
        assert_eq!(do_complex("min(4, 2, 9)"), "2");
        assert_eq!(do_complex("abs(-3)"), "3");
        assert_eq!(do_complex("floor(3.7)"), "3");
        assert_eq!(do_complex("hypot(3, 4)"), "5");
        assert_eq!(do_complex("nth(2)"), "2nd");
        assert_eq!(do_complex("nth(13)"), "13th");
        assert_eq!(do_complex("signed(3)"), "+3");
    }

    #[test]
    fn test_nested_and_chained() {
        assert_eq!(do_complex("max(min(8, 6), 2 + 3)"), "6");
        assert_eq!(do_complex("3(1+2)"), "9");
        assert_eq!(do_complex("floor(7/2) + 1"), "4");
    }

    #[test]
    fn test_failures() {
        assert_eq!(do_complex("3/0"), "(NaN)");
        assert_eq!(do_complex("hypot(1)"), "(ERR)");
        assert_eq!(do_complex("max()"), "(ERR)");
        assert_eq!(do_complex("(1 ** 2)"), "(ERR)");
    }

    #[test]
    fn test_dice_text_is_left_alone() {
        assert_eq!(do_complex("1d20+5"), "1d20+5");
        assert_eq!(do_simple("4d6dl1"), "4d6dl1");
    }

    #[test]
    fn test_spoilers_are_preserved() {
        assert_eq!(do_complex("||max(3,5)||"), "||5||");
        assert_eq!(do_complex("hit ||2 + 3|| hard"), "hit ||5|| hard");
        assert_eq!(do_pos_neg("||+-3||"), "||-3||");
    }

    #[test]
    fn test_do_pos_neg() {
        assert_eq!(do_pos_neg("+-3"), "-3");
        assert_eq!(do_pos_neg("--5"), "+5");
        assert_eq!(do_pos_neg("4+- 5"), "4-5");
        assert_eq!(do_pos_neg("-3"), "-3");
    }

    #[test]
    fn test_idempotent() {
        for input in ["max(3,5) damage", "3(1+2)", "1d20+5", "+-3", "3/0"] {
            let once = do_complex(input);
            assert_eq!(do_complex(&once), once);
        }
    }
}
