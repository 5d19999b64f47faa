//! GPIO claim tests against the simulated bank and a faulty provider.

use modus_common::hal::{HalError, PinDriver, PinMode, PinProvider};
use modus_common::module::ModuleError;
use modus_common::resource::{ResourceClass, ResourceError, ResourceId};
use modus_core::ResourceManager;
use modus_hal::{GpioError, GpioPin, SimulatedPinBank};
use std::sync::Arc;

/// Provider whose pins reject every mode.
struct Stubborn;

struct StubbornPin(ResourceId);

impl PinDriver for StubbornPin {
    fn id(&self) -> ResourceId {
        self.0
    }
    fn configure(&mut self, mode: PinMode) -> Result<(), HalError> {
        Err(HalError::UnsupportedMode { pin: self.0, mode })
    }
    fn set(&mut self, _high: bool) {}
    fn get(&self) -> bool {
        false
    }
}

impl PinProvider for Stubborn {
    fn pin(&self, id: ResourceId) -> Result<Box<dyn PinDriver>, HalError> {
        Ok(Box::new(StubbornPin(id)))
    }
}

fn setup() -> (Arc<ResourceManager>, SimulatedPinBank) {
    (Arc::new(ResourceManager::new()), SimulatedPinBank::new(16))
}

#[test]
fn claim_locks_and_configures() {
    let (resources, bank) = setup();
    let mut led = GpioPin::claim(&resources, &bank, 13, PinMode::Output, "led").unwrap();

    assert_eq!(resources.owner(ResourceClass::Gpio, 13).as_deref(), Some("led"));
    assert_eq!(bank.mode(13), Ok(Some(PinMode::Output)));

    led.high();
    assert_eq!(bank.level(13), Ok(true));
    assert!(!led.toggle());
    assert_eq!(bank.level(13), Ok(false));

    led.close().unwrap();
    assert!(!resources.is_locked(ResourceClass::Gpio, 13));
}

#[test]
fn second_claim_conflicts() {
    let (resources, bank) = setup();
    let _led = GpioPin::claim(&resources, &bank, 13, PinMode::Output, "led").unwrap();

    let err = GpioPin::claim(&resources, &bank, 13, PinMode::InputPullup, "button").unwrap_err();
    assert!(matches!(
        err,
        GpioError::Resource(ResourceError::Conflict { ref current_owner, .. }) if current_owner == "led"
    ));
}

#[test]
fn failed_configure_releases_lock() {
    let resources = Arc::new(ResourceManager::new());
    let err = GpioPin::claim(&resources, &Stubborn, 4, PinMode::Output, "pump").unwrap_err();

    assert!(matches!(err, GpioError::Hal(HalError::UnsupportedMode { pin: 4, .. })));
    assert!(!resources.is_locked(ResourceClass::Gpio, 4));
    let module_err: ModuleError = err.into();
    assert!(matches!(module_err, ModuleError::Hal(_)));
}

#[test]
fn invalid_pin_releases_lock() {
    let (resources, bank) = setup();
    let err = GpioPin::claim(&resources, &bank, 99, PinMode::Output, "led").unwrap_err();
    assert_eq!(err, GpioError::Hal(HalError::InvalidPin(99)));
    assert!(resources.is_empty());
}

#[test]
fn drop_without_close_releases_lock() {
    let (resources, bank) = setup();
    {
        let _button = GpioPin::claim(&resources, &bank, 2, PinMode::InputPullup, "button").unwrap();
        assert!(resources.is_locked(ResourceClass::Gpio, 2));
    }
    assert!(!resources.is_locked(ResourceClass::Gpio, 2));
}

#[test]
fn input_follows_external_level() {
    let (resources, bank) = setup();
    let button = GpioPin::claim(&resources, &bank, 2, PinMode::InputPullup, "button").unwrap();
    assert!(button.get());
    bank.set_input(2, false).unwrap();
    assert!(!button.get());
    assert_eq!(button.owner(), "button");
    assert_eq!(button.mode(), PinMode::InputPullup);
    button.close().unwrap();
}
