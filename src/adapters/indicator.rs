//! Readiness LED on one PWM channel.
//!
//! Levels are on the 0..=1023 analog scale the deployed firmware used, so
//! level 25 is a dim glow and level 5 is barely lit.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::Indicator;

/// Full-scale indicator level.
pub const FULL_SCALE: u16 = 1023;

pub struct PwmIndicator<P> {
    channel: P,
    level: u8,
}

impl<P: SetDutyCycle> PwmIndicator<P> {
    pub fn new(channel: P) -> Self {
        Self { channel, level: 0 }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn release(self) -> P {
        self.channel
    }
}

impl<P: SetDutyCycle> Indicator for PwmIndicator<P> {
    fn set_level(&mut self, level: u8) {
        if let Err(e) = self.channel.set_duty_cycle_fraction(u16::from(level), FULL_SCALE) {
            warn!("indicator: duty update failed: {:?}", e);
            return;
        }
        self.level = level;
    }
}
