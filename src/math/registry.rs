use once_cell::sync::Lazy;
use regex::Regex;

/// Process-wide immutable locator patterns, addressed by key. Built once on
/// first use and never invalidated, so concurrent readers need no locking.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Pattern {
    /// `||...||` spoiler segments.
    Spoiler,
    /// Named math function call with a paren-free argument list.
    FunctionCall,
    /// Innermost arithmetic group, optionally preceded by an implicit
    /// multiplier (`3(1+2)`).
    Group,
    /// A run of two or more `+`/`-` signs in front of a number.
    SignRun,
    /// A flat arithmetic run like `2 + 3*4`, starting at a word boundary so
    /// dice text such as `d20+5` is left alone.
    SimpleRun,
}

static SPOILER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|\|([^|]*)\|\|").unwrap());

static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(abs|ceil|floor|hypot|max|min|nth|round|signed|sign)\(([^()]*)\)").unwrap()
});

static GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\b([0-9]+(?:\.[0-9]+)?)[ \t]*)?\(([ \t]*[-+]?[0-9][0-9 \t.+\-*/%]*)\)")
        .unwrap()
});

static SIGN_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[-+][ \t]*){2,}[0-9]+(?:\.[0-9]+)?").unwrap());

static SIMPLE_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9]+(?:\.[0-9]+)?(?:[ \t]*[-+*/%][ \t]*[0-9]+(?:\.[0-9]+)?)+").unwrap()
});

impl Pattern {
    pub(crate) fn regex(self) -> &'static Regex {
        match self {
            Self::Spoiler => &SPOILER,
            Self::FunctionCall => &FUNCTION_CALL,
            Self::Group => &GROUP,
            Self::SignRun => &SIGN_RUN,
            Self::SimpleRun => &SIMPLE_RUN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        for p in [
            Pattern::Spoiler,
            Pattern::FunctionCall,
            Pattern::Group,
            Pattern::SignRun,
            Pattern::SimpleRun,
        ] {
            let _ = p.regex();
        }
    }

    #[test]
    fn test_simple_run_respects_word_boundaries() {
        let re = Pattern::SimpleRun.regex();
        assert!(re.find("1d20+5").is_none());
        assert_eq!(re.find("rolled 2 + 3").map(|m| m.as_str()), Some("2 + 3"));
    }

    #[test]
    fn test_function_call_prefers_longer_names() {
        let re = Pattern::FunctionCall.regex();
        let caps = re.captures("signed(3)").unwrap();
        assert_eq!(&caps[1], "signed");
    }
}
