use std::fmt::{self, Write};
use std::str::FromStr;

pub type Int = i64;
pub type UInt = u32;
pub type Float = f64;

pub type NonEmpty<T> = vec1::Vec1<T>;

/// Sign applied to a dice part's summed total.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn apply(self, x: Int) -> Int {
        match self {
            Self::Plus => x,
            Self::Minus => -x,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Plus => '+',
            Self::Minus => '-',
        };
        f.write_char(c)
    }
}

impl FromStr for Sign {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Plus),
            "-" => Ok(Self::Minus),
            _ => Err(()),
        }
    }
}

/// The closed comparator set shared by explode manipulations and tests.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Compare {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Compare {
    pub fn matches(self, lhs: Int, rhs: Int) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Gt => lhs > rhs,
            Self::Gte => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Lte => lhs <= rhs,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

impl fmt::Display for Compare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compare {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "eq" | "=" => Self::Eq,
            "gt" | ">" => Self::Gt,
            "gte" | ">=" => Self::Gte,
            "lt" | "<" => Self::Lt,
            "lteq" | "lte" | "<=" => Self::Lte,
            _ => return Err(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_from_str() {
        assert_eq!("gte".parse::<Compare>(), Ok(Compare::Gte));
        assert_eq!(">=".parse::<Compare>(), Ok(Compare::Gte));
        assert_eq!("lteq".parse::<Compare>(), Ok(Compare::Lte));
        assert_eq!("??".parse::<Compare>(), Err(()));
    }

    #[test]
    fn test_compare_matches() {
        assert!(Compare::Gte.matches(15, 15));
        assert!(!Compare::Gt.matches(15, 15));
        assert!(Compare::Lt.matches(-3, 0));
    }

    #[test]
    fn test_sign_apply() {
        assert_eq!(Sign::Plus.apply(7), 7);
        assert_eq!(Sign::Minus.apply(7), -7);
    }
}
