//! Simulated pin bank and pin driver.

use modus_common::hal::{HalError, PinDriver, PinMode, PinProvider};
use modus_common::resource::ResourceId;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// State of one simulated pin.
#[derive(Debug, Clone, Copy, Default)]
struct PinState {
    /// Configured mode, `None` until configured.
    mode: Option<PinMode>,
    /// Output latch.
    latch: bool,
    /// Externally driven input level, `None` when undriven.
    external: Option<bool>,
}

impl PinState {
    fn level(&self) -> bool {
        match self.mode {
            Some(PinMode::Output) => self.latch,
            Some(PinMode::InputPullup) => self.external.unwrap_or(true),
            Some(PinMode::InputPulldown | PinMode::Input) | None => {
                self.external.unwrap_or(false)
            }
        }
    }
}

/// Shared bank of simulated pins.
///
/// Clones share the same pins, so one clone can be registered as the
/// provider while another stimulates inputs.
#[derive(Debug, Clone)]
pub struct SimulatedPinBank {
    pins: Arc<Mutex<Vec<PinState>>>,
}

impl SimulatedPinBank {
    /// Bank of `count` unconfigured pins.
    pub fn new(count: u16) -> Self {
        debug!("SimulatedPinBank initialized: {count} pins");
        Self {
            pins: Arc::new(Mutex::new(vec![PinState::default(); count as usize])),
        }
    }

    /// Number of pins.
    pub fn pin_count(&self) -> u16 {
        // Built from a u16 count, so the length always fits.
        self.pins.lock().len() as u16
    }

    /// Drive an input from outside, as a wire or button would.
    pub fn set_input(&self, id: ResourceId, high: bool) -> Result<(), HalError> {
        self.with_pin(id, |pin| pin.external = Some(high))?;
        trace!("sim pin {id}: external level {high}");
        Ok(())
    }

    /// Stop driving an input; it falls back to its pull resistor.
    pub fn release_input(&self, id: ResourceId) -> Result<(), HalError> {
        self.with_pin(id, |pin| pin.external = None)
    }

    /// Level currently seen on a pin.
    pub fn level(&self, id: ResourceId) -> Result<bool, HalError> {
        self.with_pin(id, |pin| pin.level())
    }

    /// Configured mode of a pin.
    pub fn mode(&self, id: ResourceId) -> Result<Option<PinMode>, HalError> {
        self.with_pin(id, |pin| pin.mode)
    }

    fn with_pin<R>(&self, id: ResourceId, f: impl FnOnce(&mut PinState) -> R) -> Result<R, HalError> {
        let mut pins = self.pins.lock();
        pins.get_mut(id as usize)
            .map(f)
            .ok_or(HalError::InvalidPin(id))
    }
}

impl PinProvider for SimulatedPinBank {
    fn pin(&self, id: ResourceId) -> Result<Box<dyn PinDriver>, HalError> {
        if id >= self.pin_count() {
            return Err(HalError::InvalidPin(id));
        }
        Ok(Box::new(SimulatedPin {
            id,
            bank: self.clone(),
        }))
    }
}

/// Driver for one pin of a [`SimulatedPinBank`].
#[derive(Debug)]
pub struct SimulatedPin {
    id: ResourceId,
    bank: SimulatedPinBank,
}

impl PinDriver for SimulatedPin {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn configure(&mut self, mode: PinMode) -> Result<(), HalError> {
        self.bank.with_pin(self.id, |pin| {
            pin.mode = Some(mode);
            pin.latch = false;
        })?;
        debug!("sim pin {}: configured as {mode:?}", self.id);
        Ok(())
    }

    fn set(&mut self, high: bool) {
        let applied = self.bank.with_pin(self.id, |pin| {
            if pin.mode == Some(PinMode::Output) {
                pin.latch = high;
                true
            } else {
                false
            }
        });
        if !matches!(applied, Ok(true)) {
            trace!("sim pin {}: set ignored, not an output", self.id);
        }
    }

    fn get(&self) -> bool {
        self.bank.level(self.id).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::{DEFAULT_PIN_COUNT, create_provider};

    #[test]
    fn output_latches_level() {
        let bank = SimulatedPinBank::new(4);
        let mut pin = bank.pin(2).unwrap();
        pin.configure(PinMode::Output).unwrap();
        assert!(!pin.get());
        pin.set(true);
        assert!(pin.get());
        assert_eq!(bank.level(2), Ok(true));
        assert_eq!(bank.mode(2), Ok(Some(PinMode::Output)));
    }

    #[test]
    fn pulls_set_idle_level() {
        let bank = SimulatedPinBank::new(4);
        let mut up = bank.pin(0).unwrap();
        let mut down = bank.pin(1).unwrap();
        up.configure(PinMode::InputPullup).unwrap();
        down.configure(PinMode::InputPulldown).unwrap();
        assert!(up.get());
        assert!(!down.get());

        bank.set_input(0, false).unwrap();
        assert!(!up.get());
        bank.release_input(0).unwrap();
        assert!(up.get());
    }

    #[test]
    fn set_on_input_is_ignored() {
        let bank = SimulatedPinBank::new(1);
        let mut pin = bank.pin(0).unwrap();
        pin.configure(PinMode::InputPulldown).unwrap();
        pin.set(true);
        assert!(!pin.get());
    }

    #[test]
    fn out_of_range_pin_is_invalid() {
        let bank = SimulatedPinBank::new(2);
        assert!(matches!(bank.pin(2), Err(HalError::InvalidPin(2))));
        assert_eq!(bank.set_input(9, true), Err(HalError::InvalidPin(9)));
    }

    #[test]
    fn default_provider_has_default_pins() {
        let provider = create_provider();
        assert!(provider.pin(DEFAULT_PIN_COUNT - 1).is_ok());
        assert!(provider.pin(DEFAULT_PIN_COUNT).is_err());
    }
}
