use super::{render, RollRecord, Roller};
use crate::common::{Int, NonEmpty};
use crate::grade::{CritRule, Grade};
use crate::ops::Manipulate;
use crate::parse::DicePartSpec;

/// A realized dice part: the spec plus its rolls, total and grade.
#[derive(Debug, Clone, PartialEq)]
pub struct Dice {
    pub spec: DicePartSpec,
    pub rolls: Vec<RollRecord>,
    pub total: Int,
    pub grade: Grade,
}

// Hard ceiling on dice per part; the lexer accepts any u32 count, and a
// number like `4000000000d6` must not turn into an allocation that size.
const MAX_DICE: usize = 1000;

impl Dice {
    pub fn roll<R: Roller>(spec: DicePartSpec, crit: CritRule, roller: &mut R) -> Self {
        let count = (spec.count as usize).min(MAX_DICE);
        let mut rolls = Vec::with_capacity(count);
        {
            let mut fixed = spec.fixed_rolls.iter().copied();
            for i in 0..count {
                let value = fixed.next().unwrap_or_else(|| roller.roll(spec.sides));
                rolls.push(RollRecord::new(i, spec.sides, value));
            }
        }

        for m in &spec.manipulations {
            m.apply(&mut rolls, roller);
        }

        let sum: Int = rolls.iter().map(RollRecord::total).sum();
        let total = spec.sign.apply(sum) + spec.modifier;

        let base = match &spec.test {
            None => Grade::Unknown,
            Some(t) if t.test(total) => Grade::Success,
            Some(_) => Grade::Failure,
        };
        let grade = crit.adjust(base, total, spec.test.as_ref(), &rolls);

        Self {
            spec,
            rolls,
            total,
            grade,
        }
    }

    pub fn render(&self, mode: OutputMode) -> String {
        render::render_part(self, mode)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum OutputMode {
    #[default]
    Short,
    Long,
    Secret,
}

/// An ordered list of realized parts from one `;`-separated roll line.
#[derive(Debug, Clone, PartialEq)]
pub struct DiceGroup {
    pub parts: NonEmpty<Dice>,
    /// Index of the part whose grade stands for the whole group: the first
    /// tested part, or the first part when none carries a test.
    pub primary: usize,
    pub mode: OutputMode,
}

impl DiceGroup {
    pub fn roll<R: Roller>(
        specs: Vec<DicePartSpec>,
        crit: CritRule,
        mode: OutputMode,
        roller: &mut R,
    ) -> Self {
        let mut specs = specs.into_iter();
        let first = Dice::roll(specs.next().unwrap_or_default(), crit, roller);
        let mut parts = NonEmpty::new(first);
        for spec in specs {
            parts.push(Dice::roll(spec, crit, roller));
        }

        let primary = parts
            .iter()
            .position(|d| d.spec.test.is_some())
            .unwrap_or(0);

        Self {
            parts,
            primary,
            mode,
        }
    }

    pub fn primary(&self) -> &Dice {
        &self.parts[self.primary]
    }

    pub fn grade(&self) -> Grade {
        self.primary().grade
    }

    /// Sum of part totals; each part's sign and modifier are already folded
    /// into its own total.
    pub fn total(&self) -> Int {
        self.parts.iter().map(|d| d.total).sum()
    }

    pub fn render(&self) -> String {
        render::render_group(self)
    }
}
