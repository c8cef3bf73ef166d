// Licensed under the Apache-2.0 license

//! Busy-wait primitive shared by every blocking wait in the driver.

use crate::i2c::common::PollBudget;

/// Raised when a bounded wait runs out of spins.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Exhausted;

/// Drive a non-blocking `step` until it stops returning `WouldBlock`.
///
/// With [`PollBudget::Unbounded`] this never gives up. With
/// [`PollBudget::Spins`]`(n)` the step is attempted `n + 1` times before
/// `Exhausted` is reported, so `Spins(0)` still checks once.
///
/// # Errors
///
/// `Err(nb::Error::Other(e))` from `step` is returned as-is; running out of
/// spins maps through `on_exhausted`.
pub fn poll_until<T, E, F>(
    budget: PollBudget,
    mut step: F,
    on_exhausted: impl FnOnce(Exhausted) -> E,
) -> Result<T, E>
where
    F: FnMut() -> nb::Result<T, E>,
{
    let mut remaining = match budget {
        PollBudget::Unbounded => None,
        PollBudget::Spins(n) => Some(n),
    };
    loop {
        match step() {
            Ok(value) => return Ok(value),
            Err(nb::Error::Other(e)) => return Err(e),
            Err(nb::Error::WouldBlock) => {}
        }
        match remaining.as_mut() {
            None => {}
            Some(0) => return Err(on_exhausted(Exhausted)),
            Some(n) => *n -= 1,
        }
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_waits_for_condition() {
        let mut calls = 0u32;
        let result: Result<u32, ()> = poll_until(
            PollBudget::Unbounded,
            || {
                calls += 1;
                if calls == 10_000 {
                    Ok(calls)
                } else {
                    Err(nb::Error::WouldBlock)
                }
            },
            |_| (),
        );
        assert_eq!(result, Ok(10_000));
    }

    #[test]
    fn test_bounded_gives_up_after_budget() {
        let mut calls = 0u32;
        let result: Result<(), &str> = poll_until(
            PollBudget::Spins(5),
            || {
                calls += 1;
                Err(nb::Error::WouldBlock)
            },
            |Exhausted| "timeout",
        );
        assert_eq!(result, Err("timeout"));
        assert_eq!(calls, 6);
    }

    #[test]
    fn test_zero_budget_checks_once() {
        let result: Result<(), ()> = poll_until(PollBudget::Spins(0), || Ok(()), |_| ());
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_step_error_is_propagated() {
        let result: Result<(), &str> = poll_until(
            PollBudget::Spins(100),
            || Err(nb::Error::Other("bus fault")),
            |_| "timeout",
        );
        assert_eq!(result, Err("bus fault"));
    }
}
