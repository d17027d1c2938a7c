use crate::common::{Compare, Int};
use crate::roll::RollRecord;
use std::fmt;

/// Success test attached to a dice part. A hidden test still grades
/// normally; only the rendered target becomes `??`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TestSpec {
    pub cmp: Compare,
    pub value: Int,
    pub hidden: bool,
}

impl TestSpec {
    pub fn new(cmp: Compare, value: Int) -> Self {
        Self {
            cmp,
            value,
            hidden: false,
        }
    }

    pub fn hidden(cmp: Compare, value: Int) -> Self {
        Self {
            cmp,
            value,
            hidden: true,
        }
    }

    pub fn test(&self, total: Int) -> bool {
        self.cmp.matches(total, self.value)
    }
}

impl fmt::Display for TestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hidden {
            write!(f, "{}??", self.cmp)
        } else {
            write!(f, "{}{}", self.cmp, self.value)
        }
    }
}

/// Four-point success scale plus the ungraded state. Ordering follows
/// declaration order: `Unknown < CriticalFailure < ... < CriticalSuccess`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Grade {
    Unknown,
    CriticalFailure,
    Failure,
    Success,
    CriticalSuccess,
}

impl Grade {
    /// Saturates at `CriticalSuccess`; `Unknown` never moves.
    pub fn increase(self) -> Self {
        match self {
            Self::Unknown => Self::Unknown,
            Self::CriticalFailure => Self::Failure,
            Self::Failure => Self::Success,
            Self::Success => Self::CriticalSuccess,
            Self::CriticalSuccess => Self::CriticalSuccess,
        }
    }

    /// Saturates at `CriticalFailure`; `Unknown` never moves.
    pub fn decrease(self) -> Self {
        match self {
            Self::Unknown => Self::Unknown,
            Self::CriticalFailure => Self::CriticalFailure,
            Self::Failure => Self::CriticalFailure,
            Self::Success => Self::Failure,
            Self::CriticalSuccess => Self::Success,
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failure | Self::CriticalFailure)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "Unknown",
            Self::CriticalFailure => "Critical Failure",
            Self::Failure => "Failure",
            Self::Success => "Success",
            Self::CriticalSuccess => "Critical Success",
        };
        f.write_str(s)
    }
}

/// Game-system crit rule, supplied by the caller. `NaturalMaxMin` bumps the
/// grade on a kept natural max / min; `Margin` bumps it when the total beats
/// or misses the test target by at least `n`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum CritRule {
    #[default]
    None,
    NaturalMaxMin,
    Margin(Int),
}

impl CritRule {
    pub fn adjust(
        &self,
        base: Grade,
        total: Int,
        test: Option<&TestSpec>,
        rolls: &[RollRecord],
    ) -> Grade {
        match *self {
            Self::None => base,
            Self::NaturalMaxMin => {
                let mut grade = base;
                if rolls.iter().any(|r| !r.dropped && r.is_natural_max()) {
                    grade = grade.increase();
                }
                if rolls.iter().any(|r| !r.dropped && r.is_natural_min()) {
                    grade = grade.decrease();
                }
                grade
            }
            Self::Margin(n) => match test {
                Some(t) => {
                    if total >= t.value + n {
                        base.increase()
                    } else if total <= t.value - n {
                        base.decrease()
                    } else {
                        base
                    }
                }
                None => {
                    tracing::warn!("margin crit rule applied without a test; grade left as-is");
                    base
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_ordering() {
        assert!(Grade::Unknown < Grade::CriticalFailure);
        assert!(Grade::CriticalFailure < Grade::Failure);
        assert!(Grade::Failure < Grade::Success);
        assert!(Grade::Success < Grade::CriticalSuccess);
    }

    #[test]
    fn test_grade_saturates() {
        assert_eq!(Grade::CriticalSuccess.increase(), Grade::CriticalSuccess);
        assert_eq!(Grade::CriticalFailure.decrease(), Grade::CriticalFailure);
        assert_eq!(Grade::Unknown.increase(), Grade::Unknown);
        assert_eq!(Grade::Unknown.decrease(), Grade::Unknown);
    }

    #[test]
    fn test_spec_grades() {
        let t = TestSpec::new(Compare::Gte, 15);
        assert!(t.test(15));
        assert!(t.test(20));
        assert!(!t.test(14));
    }

    #[test]
    fn test_hidden_display() {
        let t = TestSpec::hidden(Compare::Gte, 15);
        assert_eq!(t.to_string(), ">=??");
        assert!(t.test(15));
    }

    #[test]
    fn test_natural_max_min_rule() {
        let max = RollRecord::new(0, 20, 20);
        let min = RollRecord::new(0, 20, 1);
        let mid = RollRecord::new(0, 20, 11);

        let rule = CritRule::NaturalMaxMin;
        assert_eq!(
            rule.adjust(Grade::Success, 20, None, &[max.clone()]),
            Grade::CriticalSuccess
        );
        assert_eq!(
            rule.adjust(Grade::Failure, 1, None, &[min]),
            Grade::CriticalFailure
        );
        assert_eq!(rule.adjust(Grade::Success, 11, None, &[mid]), Grade::Success);

        // dropped naturals do not crit
        let mut dropped = max;
        dropped.drop();
        assert_eq!(
            rule.adjust(Grade::Success, 20, None, &[dropped]),
            Grade::Success
        );
    }

    #[test]
    fn test_margin_rule() {
        let t = TestSpec::new(Compare::Gte, 15);
        let rule = CritRule::Margin(5);
        assert_eq!(
            rule.adjust(Grade::Success, 20, Some(&t), &[]),
            Grade::CriticalSuccess
        );
        assert_eq!(
            rule.adjust(Grade::Failure, 10, Some(&t), &[]),
            Grade::CriticalFailure
        );
        assert_eq!(rule.adjust(Grade::Success, 17, Some(&t), &[]), Grade::Success);
        assert_eq!(rule.adjust(Grade::Unknown, 20, None, &[]), Grade::Unknown);
    }
}
