//! Button module.
//!
//! Polls a pull-up input (low = pressed) and turns press patterns into
//! click commands on [`COMMAND_TOPIC`]:
//!
//! | Pattern | Command |
//! |---------|---------|
//! | one click, no second within [`DOUBLE_GAP`] | 1 |
//! | two clicks within [`DOUBLE_GAP`] | 2 |
//! | held longer than [`LONG_PRESS`] | 3 (on hold, release ignored) |
//!
//! Polling every [`POLL_PERIOD`] doubles as debouncing.

use super::{COMMAND_TOPIC, pin_provider};
use async_trait::async_trait;
use modus_common::cancel::CancelToken;
use modus_common::hal::PinMode;
use modus_common::module::{Module, ModuleError};
use modus_common::resource::ResourceId;
use modus_core::Context;
use modus_hal::GpioPin;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Module name.
pub const NAME: &str = "button";

/// Input pin (the boot button on most boards).
pub const BUTTON_PIN: ResourceId = 0;

/// Sampling period.
pub const POLL_PERIOD: Duration = Duration::from_millis(20);

/// Longest gap between two clicks of a double click.
pub const DOUBLE_GAP: Duration = Duration::from_millis(300);

/// Hold time of a long press.
pub const LONG_PRESS: Duration = Duration::from_millis(800);

/// Recognized press pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    /// One short press.
    Single,
    /// Two short presses in quick succession.
    Double,
    /// One held press.
    Long,
}

impl Click {
    /// Command value published on the bus.
    pub const fn code(self) -> i64 {
        match self {
            Click::Single => 1,
            Click::Double => 2,
            Click::Long => 3,
        }
    }
}

/// Press pattern state machine, fed one sample per poll.
#[derive(Debug, Default)]
pub struct ClickDetector {
    pressed: bool,
    press_started: Option<Instant>,
    last_release: Option<Instant>,
    clicks: u8,
    long_sent: bool,
}

impl ClickDetector {
    /// Fresh detector, button released.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample. Returns a click once its pattern is complete.
    pub fn update(&mut self, pressed: bool, now: Instant) -> Option<Click> {
        if pressed && !self.pressed {
            self.pressed = true;
            self.press_started = Some(now);
            self.long_sent = false;
        }

        if self.pressed && !self.long_sent {
            let held = self
                .press_started
                .map(|start| now.saturating_duration_since(start))
                .unwrap_or_default();
            if held > LONG_PRESS {
                self.long_sent = true;
                self.clicks = 0;
                return Some(Click::Long);
            }
        }

        if !pressed && self.pressed {
            self.pressed = false;
            if !self.long_sent {
                self.clicks += 1;
                self.last_release = Some(now);
            }
        }

        if !self.pressed && self.clicks > 0 {
            if self.clicks >= 2 {
                self.clicks = 0;
                return Some(Click::Double);
            }
            let idle = self
                .last_release
                .map(|release| now.saturating_duration_since(release))
                .unwrap_or_default();
            if idle > DOUBLE_GAP {
                self.clicks = 0;
                return Some(Click::Single);
            }
        }

        None
    }
}

/// Publishes click commands from the button pin.
pub struct ButtonModule {
    ctx: Context,
    pin: Option<GpioPin>,
    detector: ClickDetector,
}

impl ButtonModule {
    /// Module using `ctx` for its pin and the bus.
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            pin: None,
            detector: ClickDetector::new(),
        }
    }
}

#[async_trait]
impl Module for ButtonModule {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self) -> Result<(), ModuleError> {
        let provider = pin_provider(&self.ctx)?;
        let pin = GpioPin::claim(
            &self.ctx.resources,
            provider.as_ref(),
            BUTTON_PIN,
            PinMode::InputPullup,
            NAME,
        )?;
        self.pin = Some(pin);
        Ok(())
    }

    async fn start(&mut self, token: CancelToken) {
        let Some(pin) = self.pin.as_mut() else {
            return;
        };
        let mut ticker = tokio::time::interval(POLL_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Button: polling GPIO {BUTTON_PIN}");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let pressed = !pin.get();
                    if let Some(click) = self.detector.update(pressed, Instant::now()) {
                        debug!("Button: {click:?} click");
                        self.ctx.bus.publish(COMMAND_TOPIC, click.code(), None, NAME);
                    }
                }
            }
        }
    }

    fn stop(&mut self) -> Result<(), ModuleError> {
        if let Some(pin) = self.pin.take() {
            pin.close()?;
        }
        Ok(())
    }
}
