//! A dice-expression engine for chat games: tokenizes dice text such as
//! `4d6dl1` or `1d20+5 >= 15 called shot`, rolls and grades it, renders
//! markdown output, flattens saved macros, and rewrites embedded arithmetic.
//!
//! Public entry points never panic on malformed input; unparseable text
//! degrades to description tokens and is echoed back verbatim.

pub mod common;
mod error;
pub mod grade;
pub mod macros;
pub mod math;
pub mod ops;
pub mod parse;
pub mod roll;

pub use error::MathError;
pub use grade::{CritRule, Grade, TestSpec};
pub use macros::{flatten_dice_macro, Macro, OwnerType, RECURSION_SENTINEL};
pub use math::{do_complex, do_pos_neg, do_simple};
pub use ops::{SignRule, SignRules};
pub use parse::{parse_dice_part, parse_dice_parts, tokenize, DicePartSpec};
pub use roll::{Dice, DiceGroup, DefaultRoller, OutputMode, RngRoller, Roller};

/// Knobs shared by every part of one roll line.
#[derive(Debug, Clone, Default)]
pub struct RollOptions {
    pub rules: SignRules,
    pub crit: CritRule,
    pub mode: OutputMode,
}

/// Rolls one line of dice text with the thread-local RNG.
pub fn roll(input: &str) -> DiceGroup {
    roll_with(input, &RollOptions::default(), &mut DefaultRoller::new())
}

/// Rolls one line of dice text. Segments separated by `;` become parts of a
/// single group, rolled left to right from the same roller.
pub fn roll_with<R: Roller>(input: &str, options: &RollOptions, roller: &mut R) -> DiceGroup {
    let mut specs = Vec::new();
    for segment in input.split(';') {
        let tokens = parse::tokenize(segment);
        specs.extend(parse::parse_dice_parts(&tokens, &options.rules));
    }
    DiceGroup::roll(specs, options.crit, options.mode, roller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roll::StepRoller;

    #[test]
    fn test_roll_line_with_segments() {
        let group = roll_with(
            "1d20+5; 2d6",
            &RollOptions::default(),
            &mut StepRoller::new(10, 1),
        );
        assert_eq!(group.total(), 26);
        assert_eq!(group.render(), "1d20+5 (10) = 15; 2d6 (5, 6) = 11");
    }

    #[test]
    fn test_roll_line_grades() {
        let group = roll_with(
            "1d20>=15",
            &RollOptions::default(),
            &mut StepRoller::new(20, 1),
        );
        assert_eq!(group.grade(), Grade::Success);
    }

    #[test]
    fn test_empty_input_rolls_default_part() {
        let group = roll_with("", &RollOptions::default(), &mut StepRoller::new(3, 1));
        assert_eq!(group.parts.len(), 1);
    }
}
