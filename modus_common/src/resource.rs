//! Resource identification types.
//!
//! A physical resource is addressed by a [`ResourceKey`]: the
//! [`ResourceClass`] segregates hardware subsystems and the [`ResourceId`]
//! names one instance inside it (pin number, bus index, channel).

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::fmt;
use thiserror::Error;

/// Classification of a hardware resource.
///
/// Numeric codes are stable and used in serialized diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResourceClass {
    /// General purpose input/output pins.
    Gpio = 0,
    /// Inter-Integrated Circuit buses.
    I2c = 1,
    /// Serial Peripheral Interface buses.
    Spi = 2,
    /// UART ports.
    Uart = 3,
    /// Analog-to-digital converter channels.
    Adc = 4,
    /// Pulse width modulation channels.
    Pwm = 5,
    /// Hardware timers.
    Timer = 6,
    /// Direct memory access channels.
    Dma = 7,
}

const_assert_eq!(ResourceClass::Gpio as u8, 0);
const_assert_eq!(ResourceClass::Dma as u8, 7);

impl ResourceClass {
    /// Every class, in code order.
    pub const ALL: [ResourceClass; 8] = [
        ResourceClass::Gpio,
        ResourceClass::I2c,
        ResourceClass::Spi,
        ResourceClass::Uart,
        ResourceClass::Adc,
        ResourceClass::Pwm,
        ResourceClass::Timer,
        ResourceClass::Dma,
    ];

    /// Stable numeric code.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Reverse of [`ResourceClass::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Display label used in logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceClass::Gpio => "GPIO",
            ResourceClass::I2c => "I2C",
            ResourceClass::Spi => "SPI",
            ResourceClass::Uart => "UART",
            ResourceClass::Adc => "ADC",
            ResourceClass::Pwm => "PWM",
            ResourceClass::Timer => "Timer",
            ResourceClass::Dma => "DMA",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric identifier of a resource within its class.
pub type ResourceId = u16;

/// Composite key of a lockable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Hardware subsystem.
    pub class: ResourceClass,
    /// Instance within the subsystem.
    pub id: ResourceId,
}

impl ResourceKey {
    /// Build a key.
    pub const fn new(class: ResourceClass, id: ResourceId) -> Self {
        Self { class, id }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.class, self.id)
    }
}

/// Errors returned by the resource lock manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The key is already owned. Locking is not re-entrant, so this is also
    /// returned when the current owner asks again.
    #[error("resource conflict: {key} owned by '{current_owner}', requested by '{requested_by}'")]
    Conflict {
        /// Contested resource.
        key: ResourceKey,
        /// Module holding the lock.
        current_owner: String,
        /// Module that asked for it.
        requested_by: String,
    },

    /// A module tried to release a resource it does not own.
    #[error("ownership violation: '{requested_by}' tried to unlock {key} owned by '{current_owner}'")]
    OwnershipViolation {
        /// Resource targeted by the release.
        key: ResourceKey,
        /// Module holding the lock.
        current_owner: String,
        /// Module that attempted the release.
        requested_by: String,
    },

    /// Unlock of a resource nobody holds.
    #[error("resource {key} is not locked")]
    NotLocked {
        /// Resource targeted by the release.
        key: ResourceKey,
    },
}
