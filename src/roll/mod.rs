mod dice;
mod record;
mod render;
mod roller;

pub use dice::{Dice, DiceGroup, OutputMode};
pub use record::RollRecord;
pub use roller::{DefaultRoller, RngRoller, Roller};

#[cfg(test)]
pub(crate) use roller::StepRoller;
