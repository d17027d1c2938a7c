use crate::common::{Compare, Int, Sign, UInt};
use crate::roll::{RollRecord, Roller};
use std::fmt;

/// One manipulation step of a dice part. Applied in the textual order the
/// tokens appeared, not by a fixed priority: `4d6x6dl1` explodes before it
/// drops.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[enum_dispatch::enum_dispatch(Manipulate)]
pub enum Manipulation {
    DropKeep(DropKeep),
    Explode(Explode),
    Threshold(Threshold),
}

impl fmt::Display for Manipulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropKeep(x) => x.fmt(f),
            Self::Explode(x) => x.fmt(f),
            Self::Threshold(x) => x.fmt(f),
        }
    }
}

#[enum_dispatch::enum_dispatch]
pub trait Manipulate {
    fn apply<R: Roller>(&self, rolls: &mut Vec<RollRecord>, roller: &mut R);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DropKeepKind {
    Drop,
    Keep,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Edge {
    Lowest,
    Highest,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DropKeep {
    pub kind: DropKeepKind,
    pub edge: Edge,
    pub count: UInt,
}

impl DropKeep {
    pub fn new(kind: DropKeepKind, edge: Edge, count: UInt) -> Self {
        Self { kind, edge, count }
    }

    pub fn drop_lowest(count: UInt) -> Self {
        Self::new(DropKeepKind::Drop, Edge::Lowest, count)
    }

    pub fn drop_highest(count: UInt) -> Self {
        Self::new(DropKeepKind::Drop, Edge::Highest, count)
    }

    pub fn keep_lowest(count: UInt) -> Self {
        Self::new(DropKeepKind::Keep, Edge::Lowest, count)
    }

    pub fn keep_highest(count: UInt) -> Self {
        Self::new(DropKeepKind::Keep, Edge::Highest, count)
    }

    pub fn alias(&self) -> &'static str {
        match (self.kind, self.edge) {
            (DropKeepKind::Drop, Edge::Lowest) => "dl",
            (DropKeepKind::Drop, Edge::Highest) => "dh",
            (DropKeepKind::Keep, Edge::Lowest) => "kl",
            (DropKeepKind::Keep, Edge::Highest) => "kh",
        }
    }
}

impl Manipulate for DropKeep {
    fn apply<R: Roller>(&self, rolls: &mut Vec<RollRecord>, _: &mut R) {
        // Sorted copy of the kept indices; stable sort keeps ties in
        // original roll order.
        let mut kept: Vec<usize> = (0..rolls.len()).filter(|&i| !rolls[i].dropped).collect();
        kept.sort_by_key(|&i| rolls[i].effective());

        let n = (self.count as usize).min(kept.len());
        let to_drop: Vec<usize> = match (self.kind, self.edge) {
            (DropKeepKind::Drop, Edge::Lowest) => kept[..n].to_vec(),
            (DropKeepKind::Drop, Edge::Highest) => kept[kept.len() - n..].to_vec(),
            (DropKeepKind::Keep, Edge::Lowest) => kept[n..].to_vec(),
            (DropKeepKind::Keep, Edge::Highest) => kept[..kept.len() - n].to_vec(),
        };
        for i in to_drop {
            rolls[i].drop();
        }
    }
}

impl fmt::Display for DropKeep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.alias(), self.count)
    }
}

/// `threshold` of `None` means "equal to the die size", resolved per record
/// so mixed-size explosion children keep the right trigger.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Explode {
    pub cmp: Compare,
    pub threshold: Option<UInt>,
}

impl Explode {
    pub fn new(cmp: Compare, threshold: Option<UInt>) -> Self {
        Self { cmp, threshold }
    }

    pub fn default_for_die() -> Self {
        Self::new(Compare::Eq, None)
    }

    fn triggers(&self, value: Int, die_size: UInt) -> bool {
        let threshold = self.threshold.unwrap_or(die_size) as Int;
        self.cmp.matches(value, threshold)
    }
}

impl Manipulate for Explode {
    fn apply<R: Roller>(&self, rolls: &mut Vec<RollRecord>, roller: &mut R) {
        // Termination is driven by the outstanding-explosion count, not the
        // rolled values: each queued explosion is resolved exactly once, and
        // a new die that does not trigger retires its slot.
        let mut pending: Vec<UInt> = Vec::new();
        for r in rolls.iter_mut().filter(|r| !r.dropped) {
            if self.triggers(r.effective(), r.die_size) {
                r.exploded = true;
                pending.push(r.die_size);
            }
        }

        let mut generated = 0;
        while let Some(size) = pending.pop() {
            let value = roller.roll(size);
            generated += 1;
            let mut child = RollRecord::explosion_child(rolls.len(), size, value);
            if self.triggers(value, size) && generated < MAX_EXPLOSIONS {
                child.exploded = true;
                pending.push(size);
            }
            rolls.push(child);
        }
    }
}

// Hard ceiling on generated children for comparisons like `x>0` that every
// possible value satisfies.
const MAX_EXPLOSIONS: usize = 1000;

impl fmt::Display for Explode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("x")?;
        if self.cmp != Compare::Eq {
            write!(f, "{}", self.cmp)?;
        }
        if let Some(t) = self.threshold {
            write!(f, "{}", t)?;
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ThresholdEdge {
    Bottom,
    Top,
}

/// Clamps effective values that cross the configured bound. The natural
/// value is preserved for rendering; only the effective value changes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Threshold {
    pub edge: ThresholdEdge,
    pub value: UInt,
}

impl Threshold {
    pub fn bottom(value: UInt) -> Self {
        Self {
            edge: ThresholdEdge::Bottom,
            value,
        }
    }

    pub fn top(value: UInt) -> Self {
        Self {
            edge: ThresholdEdge::Top,
            value,
        }
    }
}

impl Manipulate for Threshold {
    fn apply<R: Roller>(&self, rolls: &mut Vec<RollRecord>, _: &mut R) {
        let bound = self.value as Int;
        for r in rolls.iter_mut() {
            match self.edge {
                ThresholdEdge::Top if r.effective() > bound => {
                    r.override_value(bound);
                    r.above_threshold = true;
                }
                ThresholdEdge::Bottom if r.effective() < bound => {
                    r.override_value(bound);
                    r.below_threshold = true;
                }
                _ => {}
            }
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alias = match self.edge {
            ThresholdEdge::Bottom => "bt",
            ThresholdEdge::Top => "tt",
        };
        write!(f, "{}{}", alias, self.value)
    }
}

/// Per-game-system sugar turning a leading `+`/`-` on a dice token into a
/// synthesized DropKeep (advantage/disadvantage). Nothing is built in; the
/// caller configures entries per die size.
#[derive(Debug, Clone, Default)]
pub struct SignRules {
    rules: Vec<SignRule>,
}

#[derive(Debug, Copy, Clone)]
pub struct SignRule {
    pub sides: UInt,
    pub plus: Option<DropKeep>,
    pub minus: Option<DropKeep>,
}

impl SignRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: SignRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn lookup(&self, sign: Sign, sides: UInt) -> Option<DropKeep> {
        self.rules
            .iter()
            .find(|r| r.sides == sides)
            .and_then(|r| match sign {
                Sign::Plus => r.plus,
                Sign::Minus => r.minus,
            })
    }
}
