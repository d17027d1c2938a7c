use crate::common::{Int, UInt};

/// One physical die outcome. Owned exclusively by the dice-part evaluation
/// that produced it; records are never shared across parts.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RollRecord {
    pub index: usize,
    pub die_size: UInt,
    pub value: Int,
    pub dropped: bool,
    pub exploded: bool,
    pub explosion_child: bool,
    pub overridden: Option<Int>,
    pub above_threshold: bool,
    pub below_threshold: bool,
}

impl RollRecord {
    pub fn new(index: usize, die_size: UInt, value: Int) -> Self {
        Self {
            index,
            die_size,
            value,
            dropped: false,
            exploded: false,
            explosion_child: false,
            overridden: None,
            above_threshold: false,
            below_threshold: false,
        }
    }

    pub fn explosion_child(index: usize, die_size: UInt, value: Int) -> Self {
        Self {
            explosion_child: true,
            ..Self::new(index, die_size, value)
        }
    }

    /// The value used for summation and testing, after any threshold override.
    pub fn effective(&self) -> Int {
        self.overridden.unwrap_or(self.value)
    }

    pub fn total(&self) -> Int {
        if self.dropped {
            0
        } else {
            self.effective()
        }
    }

    pub fn override_value(&mut self, value: Int) {
        self.overridden = Some(value);
    }

    pub fn drop(&mut self) {
        self.dropped = true;
    }

    pub fn is_natural_max(&self) -> bool {
        self.die_size > 1 && self.value == self.die_size as Int
    }

    pub fn is_natural_min(&self) -> bool {
        self.die_size > 1 && self.value == 1
    }
}
