//! Recursive macro flattening. Macros are textual dice templates; expanding
//! one splices argument values into its template and re-resolves the result,
//! so a template may freely call other macros. Termination is guaranteed by
//! the cycle trail (an input string that comes up for expansion twice in one
//! call chain aborts with [`RECURSION_SENTINEL`]) plus a depth ceiling for
//! self-calls whose text mutates on every pass.

use once_cell::sync::Lazy;
use regex::Regex;

/// Literal returned in place of an expansion that revisited its own input.
/// It parses as a harmless zero-sided roll.
pub const RECURSION_SENTINEL: &str = "[0d0 Recursion!]";

/// Upper bound on the `Nx` repeat prefix of a bracketed block.
const MAX_REPEATS: usize = 20;

// Hard ceiling on expansion depth for self-calls whose substituted text
// grows each pass and so never trips the repetition check.
const MAX_EXPANSIONS: usize = 100;

/// Where a macro definition lives. Callers group macros into tiers by owner
/// scope; the engine only cares about tier order, not the scopes themselves.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OwnerType {
    Character,
    Game,
    Server,
    Global,
}

/// A named dice template. `template` may contain positional (`${1}`) and
/// named (`${key}` or `${key:default}`) placeholders bound at the call site.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub category: Option<String>,
    pub template: String,
    pub owner_id: String,
    pub owner_type: OwnerType,
}

impl Macro {
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        owner_id: impl Into<String>,
        owner_type: OwnerType,
    ) -> Self {
        Self {
            name: name.into(),
            category: None,
            template: template.into(),
            owner_id: owner_id.into(),
            owner_type,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Arguments bound by one macro call. Positional arguments are addressed as
/// `${1}`, `${2}`, ...; named arguments as `${key}`.
#[derive(Debug, Clone, Default)]
pub struct ArgFrame {
    positional: Vec<String>,
    named: Vec<(String, String)>,
}

impl ArgFrame {
    fn lookup(&self, key: &str) -> Option<&str> {
        if let Ok(index) = key.parse::<usize>() {
            return index
                .checked_sub(1)
                .and_then(|i| self.positional.get(i))
                .map(String::as_str);
        }
        self.named
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }
}

/// Expands every macro call in `input` against `tiers` (highest-precedence
/// tier first) and returns the flattened dice strings, one per roll.
pub fn flatten_dice_macro(input: &str, tiers: &[&[Macro]]) -> Vec<String> {
    flatten(input, tiers, &[], &[])
}

fn flatten(input: &str, tiers: &[&[Macro]], frames: &[ArgFrame], stack: &[String]) -> Vec<String> {
    let input = input.trim();
    if input.is_empty() {
        return Vec::new();
    }
    if stack.iter().any(|seen| seen == input) {
        tracing::warn!(input, "macro expansion revisited its own input");
        return vec![RECURSION_SENTINEL.to_string()];
    }
    if stack.len() >= MAX_EXPANSIONS {
        tracing::warn!(input, "macro expansion depth limit reached");
        return vec![RECURSION_SENTINEL.to_string()];
    }

    // `;` outside brackets chains segments into one joined roll line. This
    // runs before block stripping so `[a]; [b]` is not mistaken for a single
    // bracket-wrapped block.
    if let Some(segments) = split_top_level(input) {
        let mut parts = Vec::new();
        for segment in segments {
            parts.extend(flatten(segment, tiers, frames, stack));
        }
        return vec![parts.join("; ")];
    }

    // `[a][b]` and `[a] [b]` are independent blocks, each rolled separately.
    if let Some(blocks) = strip_blocks(input) {
        let mut out = Vec::new();
        for block in blocks {
            let (repeats, rest) = split_repeat(block);
            for _ in 0..repeats {
                out.extend(flatten(rest, tiers, frames, stack));
            }
        }
        return out;
    }

    let text = substitute(input, frames);
    let (makro, matched_len) = match find_macro(&text, tiers) {
        Some(found) => found,
        None => return vec![text],
    };
    if stack.iter().any(|seen| *seen == text) {
        tracing::warn!(input = %text, "macro expansion revisited its own input");
        return vec![RECURSION_SENTINEL.to_string()];
    }

    let mut frames = frames.to_vec();
    frames.push(parse_args(&text[matched_len..]));
    let mut stack = stack.to_vec();
    stack.push(text.clone());
    flatten(&makro.template, tiers, &frames, &stack)
}

/// Splits `[a][b]` (or `[a] [b]`) into its blocks; `None` if `input` is not
/// bracket-wrapped. Block boundaries are only recognized at bracket depth
/// zero, so nested calls inside a block do not split their parent.
fn strip_blocks(input: &str) -> Option<Vec<&str>> {
    if input.len() < 2 || !input.starts_with('[') || !input.ends_with(']') {
        return None;
    }
    let inner = &input[1..input.len() - 1];
    let bytes = inner.as_bytes();

    let mut blocks = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'[' => depth += 1,
            b']' if depth > 0 => depth -= 1,
            b']' => {
                // a boundary only if `[` follows (after optional spaces);
                // a stray `]` stays part of the block text
                let mut j = i + 1;
                while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j] == b'[' {
                    blocks.push(&inner[start..i]);
                    start = j + 1;
                    i = j;
                }
            }
            _ => {}
        }
        i += 1;
    }
    blocks.push(&inner[start..]);
    Some(blocks)
}

/// Peels a leading `Nx ` repeat prefix off a block.
fn split_repeat(block: &str) -> (usize, &str) {
    let block = block.trim();
    if let Some((head, rest)) = block.split_once('x') {
        if !head.is_empty()
            && head.chars().all(|c| c.is_ascii_digit())
            && rest.starts_with(|c: char| c.is_ascii_whitespace())
        {
            if let Ok(n) = head.parse::<usize>() {
                return (n.clamp(1, MAX_REPEATS), rest.trim_start());
            }
        }
    }
    (1, block)
}

/// Splits on `;` at bracket depth zero; `None` if there is nothing to split.
fn split_top_level(input: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                segments.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if segments.is_empty() {
        return None;
    }
    segments.push(&input[start..]);
    Some(segments)
}

/// Longest macro name that prefixes `text` at a whitespace boundary, ties
/// broken by earlier tier. Returns the macro and the matched length.
fn find_macro<'a>(text: &str, tiers: &[&'a [Macro]]) -> Option<(&'a Macro, usize)> {
    let mut best: Option<(&'a Macro, usize)> = None;
    for tier in tiers {
        for makro in *tier {
            let len = makro.name.len();
            let head = match text.get(..len) {
                Some(head) => head,
                None => continue,
            };
            if !head.eq_ignore_ascii_case(&makro.name) {
                continue;
            }
            if !text[len..].chars().next().map_or(true, char::is_whitespace) {
                continue;
            }
            if best.map_or(true, |(_, best_len)| len > best_len) {
                best = Some((makro, len));
            }
        }
    }
    best
}

fn parse_args(remainder: &str) -> ArgFrame {
    let mut frame = ArgFrame::default();
    for word in remainder.split_whitespace() {
        match word.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                frame.named.push((key.to_string(), value.to_string()));
            }
            _ => frame.positional.push(word.to_string()),
        }
    }
    frame
}

/// Replaces `${...}` placeholders, innermost binding frame first. Unbound
/// placeholders fall back to their inline default, or vanish.
fn substitute(text: &str, frames: &[ArgFrame]) -> String {
    static PLACEHOLDER: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\$\{([A-Za-z0-9_]+)(?::([^{}]*))?\}").unwrap());
    PLACEHOLDER
        .replace_all(text, |caps: &regex::Captures| {
            let key = &caps[1];
            for frame in frames.iter().rev() {
                if let Some(value) = frame.lookup(key) {
                    return value.to_string();
                }
            }
            caps.get(2)
                .map_or_else(String::new, |d| d.as_str().to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(name: &str, template: &str) -> Macro {
        Macro::new(name, template, "owner", OwnerType::Global)
    }

    #[test]
    fn test_literal_text_passes_through() {
        assert_eq!(flatten_dice_macro("1d20+5", &[]), vec!["1d20+5"]);
        assert_eq!(
            flatten_dice_macro("[1d20+5]", &[]),
            vec!["1d20+5".to_string()]
        );
    }

    #[test]
    fn test_named_argument_substitution() {
        let tier = [mac("PowerAttack", "1d20+${str}")];
        assert_eq!(
            flatten_dice_macro("[PowerAttack str=5]", &[&tier]),
            vec!["1d20+5"]
        );
    }

    #[test]
    fn test_positional_arguments_and_defaults() {
        let tier = [mac("atk", "1d20+${1} vs AC ${ac:10}")];
        assert_eq!(
            flatten_dice_macro("[atk 5]", &[&tier]),
            vec!["1d20+5 vs AC 10"]
        );
        assert_eq!(
            flatten_dice_macro("[atk 5 ac=15]", &[&tier]),
            vec!["1d20+5 vs AC 15"]
        );
    }

    #[test]
    fn test_longest_name_wins() {
        let tier = [mac("heal", "1d4"), mac("healall", "2d4")];
        assert_eq!(flatten_dice_macro("[healall]", &[&tier]), vec!["2d4"]);
        assert_eq!(flatten_dice_macro("[heal]", &[&tier]), vec!["1d4"]);
    }

    #[test]
    fn test_earlier_tier_wins_ties() {
        let character = [mac("heal", "1d8")];
        let global = [mac("heal", "1d4")];
        assert_eq!(
            flatten_dice_macro("[heal]", &[&character, &global]),
            vec!["1d8"]
        );
    }

    #[test]
    fn test_macro_names_match_case_insensitively() {
        let tier = [mac("Smite", "2d8")];
        assert_eq!(flatten_dice_macro("[smite]", &[&tier]), vec!["2d8"]);
    }

    #[test]
    fn test_multi_block_and_repeat() {
        let tier = [mac("attack", "1d20"), mac("damage", "2d6")];
        assert_eq!(
            flatten_dice_macro("[attack][damage]", &[&tier]),
            vec!["1d20", "2d6"]
        );
        assert_eq!(
            flatten_dice_macro("[3x attack]", &[&tier]),
            vec!["1d20", "1d20", "1d20"]
        );
    }

    #[test]
    fn test_semicolon_chain_rejoins() {
        let tier = [mac("attack", "1d20"), mac("damage", "2d6")];
        assert_eq!(
            flatten_dice_macro("[attack; damage]", &[&tier]),
            vec!["1d20; 2d6"]
        );
        assert_eq!(flatten_dice_macro("1d20; 2d6", &[]), vec!["1d20; 2d6"]);
    }

    #[test]
    fn test_macros_expand_recursively() {
        let tier = [mac("fullattack", "[attack]; [damage]"), mac("attack", "1d20"), mac("damage", "2d6")];
        assert_eq!(
            flatten_dice_macro("[fullattack]", &[&tier]),
            vec!["1d20; 2d6"]
        );
    }

    #[test]
    fn test_direct_cycle_hits_sentinel() {
        let tier = [mac("loop", "[loop]")];
        assert_eq!(
            flatten_dice_macro("[loop]", &[&tier]),
            vec![RECURSION_SENTINEL.to_string()]
        );
    }

    #[test]
    fn test_indirect_cycle_hits_sentinel() {
        let tier = [mac("ping", "[pong]"), mac("pong", "[ping]")];
        assert_eq!(
            flatten_dice_macro("[ping]", &[&tier]),
            vec![RECURSION_SENTINEL.to_string()]
        );
    }

    #[test]
    fn test_growing_argument_self_call_terminates() {
        // each expansion substitutes a longer argument, so the input text
        // never repeats; the depth ceiling must stop it
        let tier = [mac("b", "b ${1}x")];
        assert_eq!(
            flatten_dice_macro("[b x]", &[&tier]),
            vec![RECURSION_SENTINEL.to_string()]
        );
    }

    #[test]
    fn test_adjacent_nested_blocks_stay_in_their_block() {
        assert_eq!(
            flatten_dice_macro("[1d4 [x][y] 1d6]", &[]),
            vec!["1d4 [x][y] 1d6"]
        );
    }

    #[test]
    fn test_deep_but_acyclic_chain_completes() {
        let tier = [
            mac("a", "[b 1]"),
            mac("b", "[c ${1}]"),
            mac("c", "2d6+${1}"),
        ];
        assert_eq!(flatten_dice_macro("[a]", &[&tier]), vec!["2d6+1"]);
    }
}
