//! PWM output driver for capability values.
//!
//! Each channel is bound to one `(controller pin, capability)` pair and
//! tracks that capability's value within its bounds: `min` is off, `max` is
//! fully on. Duty is only rewritten when the value changes.

use embedded_hal::pwm::SetDutyCycle;
use log::{debug, warn};

use crate::app::ports::Actuator;
use crate::bounded::NameStr;
use crate::capability::{Capability, Controller};

struct Channel<P> {
    pin: u8,
    capability: NameStr,
    output: P,
    applied: Option<u16>,
}

/// Drives up to `N` PWM channels.
pub struct PwmActuator<P, const N: usize> {
    channels: heapless::Vec<Channel<P>, N>,
}

impl<P: SetDutyCycle, const N: usize> Default for PwmActuator<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SetDutyCycle, const N: usize> PwmActuator<P, N> {
    pub fn new() -> Self {
        Self {
            channels: heapless::Vec::new(),
        }
    }

    /// Bind `output` to capability `capability` of the controller on `pin`.
    /// Gives the output back when all `N` channels are taken.
    pub fn bind(&mut self, pin: u8, capability: &str, output: P) -> Result<(), P> {
        self.channels
            .push(Channel {
                pin,
                capability: NameStr::from(capability),
                output,
                applied: None,
            })
            .map_err(|c| c.output)
    }

    /// Last value written to the channel bound to `(pin, capability)`.
    pub fn applied(&self, pin: u8, capability: &str) -> Option<u16> {
        self.channels
            .iter()
            .find(|c| c.pin == pin && c.capability == capability)
            .and_then(|c| c.applied)
    }
}

fn drive<P: SetDutyCycle>(output: &mut P, cap: &Capability) -> Result<(), P::Error> {
    let span = cap.max() - cap.min();
    if span == 0 {
        return output.set_duty_cycle_fully_on();
    }
    output.set_duty_cycle_fraction(cap.value() - cap.min(), span)
}

impl<P: SetDutyCycle, const N: usize> Actuator for PwmActuator<P, N> {
    fn apply(&mut self, controller: &Controller, _now_ms: u64) {
        for ch in self.channels.iter_mut().filter(|c| c.pin == controller.pin()) {
            let Some(cap) = controller.find(ch.capability.as_str()) else {
                continue;
            };
            if ch.applied == Some(cap.value()) {
                continue;
            }
            match drive(&mut ch.output, cap) {
                Ok(()) => {
                    debug!("pwm: pin {} {}={}", ch.pin, ch.capability, cap.value());
                    ch.applied = Some(cap.value());
                }
                Err(e) => warn!("pwm: pin {} {} duty update failed: {:?}", ch.pin, ch.capability, e),
            }
        }
    }
}
