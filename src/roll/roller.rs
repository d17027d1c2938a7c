use crate::common::{Int, UInt};
use rand::Rng;

/// Source of individual die values. Production rolls go through
/// [`RngRoller`] ([`DefaultRoller`] is CSPRNG-backed); tests use the
/// deterministic [`StepRoller`].
pub trait Roller {
    fn roll(&mut self, sides: UInt) -> Int;
}

/// Adapter turning any [`rand::Rng`] into a [`Roller`].
#[derive(Debug, Clone)]
pub struct RngRoller<R>(pub R);

pub type DefaultRoller = RngRoller<rand::rngs::ThreadRng>;

impl DefaultRoller {
    pub fn new() -> Self {
        RngRoller(rand::thread_rng())
    }
}

impl Default for DefaultRoller {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Roller for RngRoller<R> {
    fn roll(&mut self, sides: UInt) -> Int {
        if sides == 0 {
            0
        } else {
            self.0.gen_range(1..=sides) as Int
        }
    }
}

#[cfg(test)]
pub(crate) use step::StepRoller;

#[cfg(test)]
mod step {
    use super::*;

    /// Rolls `initial, initial + step, ...` wrapped into `1..=sides`.
    pub(crate) struct StepRoller {
        current: UInt,
        step: UInt,
    }

    impl StepRoller {
        pub fn new(initial: UInt, step: UInt) -> Self {
            Self {
                current: initial,
                step,
            }
        }
    }

    impl Roller for StepRoller {
        fn roll(&mut self, sides: UInt) -> Int {
            if sides == 0 {
                return 0;
            }
            let ret = (self.current - 1) % sides + 1;
            self.current += self.step;
            ret as Int
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_step_roller_wraps() {
            let mut r = StepRoller::new(5, 1);
            assert_eq!(r.roll(6), 5);
            assert_eq!(r.roll(6), 6);
            assert_eq!(r.roll(6), 1);
            assert_eq!(r.roll(0), 0);
        }
    }
}
