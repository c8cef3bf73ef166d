// Licensed under the Apache-2.0 license

//! Common types and constants for the MSSP I2C driver modules.
//!
//! Bus speeds, transfer direction, acknowledge status, wait budgets and the
//! configuration builder that turns a core clock and bus speed into the
//! SSPADD divisor.

use fugit::HertzU32;

/// Core clock the driver assumes unless told otherwise (PIC18F4550 with the
/// USB PLL).
pub const DEFAULT_CORE_CLOCK: HertzU32 = HertzU32::MHz(48);

/// Smallest SSPADD value the baud generator supports in master mode.
pub const MIN_DIVISOR: u32 = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum I2cSpeed {
    Standard = 100_000,
    Fast = 400_000,
    FastPlus = 1_000_000,
}

impl I2cSpeed {
    #[must_use]
    pub const fn frequency(self) -> HertzU32 {
        HertzU32::from_raw(self as u32)
    }
}

/// R/W bit carried in the low bit of the address byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

/// Acknowledge bit as sampled from (or driven onto) SDA after a byte.
///
/// `Ack` is 0 and `Nack` is 1, matching the line level and the ACKSTAT /
/// ACKDT register bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AckStatus {
    Ack = 0,
    Nack = 1,
}

impl AckStatus {
    #[must_use]
    pub const fn from_bit(set: bool) -> Self {
        if set {
            AckStatus::Nack
        } else {
            AckStatus::Ack
        }
    }

    /// Raw status value: 0 on success, 1 when the target did not acknowledge.
    #[must_use]
    pub const fn bit(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn is_ack(self) -> bool {
        matches!(self, AckStatus::Ack)
    }
}

/// How long a busy-wait may spin before giving up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PollBudget {
    /// Spin until the condition holds. A dead bus hangs the caller.
    Unbounded,
    /// Give up with `Error::BusTimeout` after this many failed polls.
    Spins(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A clock or bus frequency of zero was supplied.
    ZeroFrequency,
    /// `clock / (4 * bus) - 1` does not fit the 8-bit SSPADD register or is
    /// below [`MIN_DIVISOR`].
    DivisorOutOfRange,
}

/// SSPADD value for the requested bus rate: `clock / (4 * bus) - 1`.
///
/// # Errors
///
/// Returns `ZeroFrequency` for a zero clock or bus rate and
/// `DivisorOutOfRange` when the result leaves `MIN_DIVISOR..=255`.
pub const fn baud_divisor(core_clock: HertzU32, bus: HertzU32) -> Result<u8, ConfigurationError> {
    let clock = core_clock.to_Hz();
    let bus = bus.to_Hz();
    if clock == 0 || bus == 0 {
        return Err(ConfigurationError::ZeroFrequency);
    }
    let Some(quarter_period) = bus.checked_mul(4) else {
        return Err(ConfigurationError::DivisorOutOfRange);
    };
    let ticks = clock / quarter_period;
    if ticks < MIN_DIVISOR + 1 || ticks > u8::MAX as u32 + 1 {
        return Err(ConfigurationError::DivisorOutOfRange);
    }
    #[allow(clippy::cast_possible_truncation)]
    let divisor = (ticks - 1) as u8;
    Ok(divisor)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct I2cConfig {
    pub speed: I2cSpeed,
    pub core_clock: HertzU32,
    pub poll_budget: PollBudget,
    /// Precomputed SSPADD value.
    pub divisor: u8,
}

impl I2cConfig {
    /// Bus clock actually produced by `divisor`: `clock / (4 * (divisor + 1))`.
    #[must_use]
    pub const fn effective_bus_rate(&self) -> HertzU32 {
        HertzU32::from_raw(self.core_clock.to_Hz() / (4 * (self.divisor as u32 + 1)))
    }
}

pub struct I2cConfigBuilder {
    speed: I2cSpeed,
    core_clock: HertzU32,
    poll_budget: PollBudget,
}

impl Default for I2cConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            speed: I2cSpeed::Standard,
            core_clock: DEFAULT_CORE_CLOCK,
            poll_budget: PollBudget::Unbounded,
        }
    }
    #[must_use]
    pub const fn speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }
    #[must_use]
    pub const fn core_clock(mut self, clock: HertzU32) -> Self {
        self.core_clock = clock;
        self
    }
    #[must_use]
    pub const fn poll_budget(mut self, budget: PollBudget) -> Self {
        self.poll_budget = budget;
        self
    }

    /// Usable in `const` context so a driver can be placed in a `static`.
    ///
    /// # Errors
    ///
    /// Propagates [`baud_divisor`] failures.
    pub const fn build(self) -> Result<I2cConfig, ConfigurationError> {
        match baud_divisor(self.core_clock, self.speed.frequency()) {
            Ok(divisor) => Ok(I2cConfig {
                speed: self.speed,
                core_clock: self.core_clock,
                poll_budget: self.poll_budget,
                divisor,
            }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divisor_at_48mhz() {
        let clock = HertzU32::MHz(48);
        assert_eq!(baud_divisor(clock, I2cSpeed::Standard.frequency()), Ok(0x77));
        assert_eq!(baud_divisor(clock, I2cSpeed::Fast.frequency()), Ok(0x1D));
        assert_eq!(baud_divisor(clock, I2cSpeed::FastPlus.frequency()), Ok(0x0B));
    }

    #[test]
    fn test_divisor_range_checks() {
        assert_eq!(
            baud_divisor(HertzU32::from_raw(0), I2cSpeed::Standard.frequency()),
            Err(ConfigurationError::ZeroFrequency)
        );
        assert_eq!(
            baud_divisor(HertzU32::MHz(48), HertzU32::from_raw(0)),
            Err(ConfigurationError::ZeroFrequency)
        );
        // 4 MHz core cannot reach 1 MHz: divisor would be 0.
        assert_eq!(
            baud_divisor(HertzU32::MHz(4), I2cSpeed::FastPlus.frequency()),
            Err(ConfigurationError::DivisorOutOfRange)
        );
        // 48 MHz / (4 * 10 kHz) - 1 = 1199, too wide for SSPADD.
        assert_eq!(
            baud_divisor(HertzU32::MHz(48), HertzU32::kHz(10)),
            Err(ConfigurationError::DivisorOutOfRange)
        );
        // Upper edge: 102.4 MHz / (4 * 100 kHz) = 256 ticks -> 255.
        assert_eq!(
            baud_divisor(HertzU32::from_raw(102_400_000), I2cSpeed::Standard.frequency()),
            Ok(255)
        );
    }

    #[test]
    fn test_builder_defaults() {
        let config = I2cConfigBuilder::new().build().unwrap();
        assert_eq!(config.speed, I2cSpeed::Standard);
        assert_eq!(config.core_clock, DEFAULT_CORE_CLOCK);
        assert_eq!(config.poll_budget, PollBudget::Unbounded);
        assert_eq!(config.divisor, 0x77);
        assert_eq!(config.effective_bus_rate(), HertzU32::kHz(100));
    }

    #[test]
    fn test_builder_overrides() {
        let config = I2cConfigBuilder::new()
            .speed(I2cSpeed::Fast)
            .core_clock(HertzU32::MHz(16))
            .poll_budget(PollBudget::Spins(500))
            .build()
            .unwrap();
        assert_eq!(config.divisor, 9);
        assert_eq!(config.poll_budget, PollBudget::Spins(500));
    }

    #[test]
    fn test_build_in_const_context() {
        const CONFIG: I2cConfig = match I2cConfigBuilder::new().speed(I2cSpeed::Fast).build() {
            Ok(config) => config,
            Err(_) => panic!("invalid bus configuration"),
        };
        assert_eq!(CONFIG.divisor, 0x1D);
    }

    #[test]
    fn test_ack_status_bits() {
        assert_eq!(AckStatus::from_bit(false), AckStatus::Ack);
        assert_eq!(AckStatus::from_bit(true), AckStatus::Nack);
        assert_eq!(AckStatus::Ack.bit(), 0);
        assert_eq!(AckStatus::Nack.bit(), 1);
        assert!(AckStatus::Ack.is_ack());
        assert_eq!(Direction::Read as u8, 1);
    }
}
