//! LED module.
//!
//! Listens for click commands and animates the status LED:
//!
//! | Command | Mode | Pattern |
//! |---------|------|---------|
//! | 1 (single) | off | steady low |
//! | 2 (double) | heartbeat | two short pulses, long pause |
//! | 3 (long) | strobe | toggles every two frames |
//!
//! The last mode is written to the settings store when one is configured
//! and restored on the next boot.

use super::{COMMAND_TOPIC, pin_provider};
use async_trait::async_trait;
use modus_common::cancel::CancelToken;
use modus_common::hal::PinMode;
use modus_common::module::{Module, ModuleError};
use modus_common::resource::ResourceId;
use modus_common::store::StoreError;
use modus_core::{Context, Subscription};
use modus_hal::GpioPin;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Module name.
pub const NAME: &str = "led";

/// Output pin.
pub const LED_PIN: ResourceId = 13;

/// Animation frame period.
pub const FRAME_PERIOD: Duration = Duration::from_millis(50);

/// Frames per heartbeat cycle.
const HEARTBEAT_FRAMES: u32 = 25;

/// Display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedMode {
    /// Steady off.
    #[default]
    Off,
    /// Fast blink.
    Strobe,
    /// Double pulse with a pause.
    Heartbeat,
}

impl LedMode {
    /// Mode selected by a click command, `None` for unknown commands.
    pub fn from_command(cmd: i64) -> Option<Self> {
        match cmd {
            1 => Some(LedMode::Off),
            2 => Some(LedMode::Heartbeat),
            3 => Some(LedMode::Strobe),
            _ => None,
        }
    }
}

/// Persisted LED settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedSettings {
    /// Last selected mode.
    pub mode: LedMode,
}

/// Frame generator for the current mode.
#[derive(Debug, Default)]
pub struct Animator {
    mode: LedMode,
    frame: u32,
}

impl Animator {
    /// Animator starting in `mode`.
    pub fn new(mode: LedMode) -> Self {
        Self { mode, frame: 0 }
    }

    /// Current mode.
    pub fn mode(&self) -> LedMode {
        self.mode
    }

    /// Switch mode and restart the pattern.
    pub fn set_mode(&mut self, mode: LedMode) {
        self.mode = mode;
        self.frame = 0;
    }

    /// Advance one frame. Returns the level to drive given the `current` one.
    pub fn next_level(&mut self, current: bool) -> bool {
        self.frame = self.frame.wrapping_add(1);
        match self.mode {
            LedMode::Off => false,
            LedMode::Strobe => {
                if self.frame % 2 == 0 {
                    !current
                } else {
                    current
                }
            }
            LedMode::Heartbeat => {
                let phase = self.frame % HEARTBEAT_FRAMES;
                phase < 2 || (4..6).contains(&phase)
            }
        }
    }
}

/// Drives the status LED from click commands.
pub struct LedModule {
    ctx: Context,
    pin: Option<GpioPin>,
    commands: Option<Subscription>,
    animator: Animator,
}

impl LedModule {
    /// Module using `ctx` for its pin, the bus and settings.
    pub fn new(ctx: Context) -> Self {
        Self {
            ctx,
            pin: None,
            commands: None,
            animator: Animator::default(),
        }
    }

    fn restore_mode(&self) -> LedMode {
        let Some(settings) = self.ctx.settings.as_ref() else {
            return LedMode::default();
        };
        match settings.load::<LedSettings>() {
            Ok(saved) => {
                info!("LED: restored mode {:?}", saved.mode);
                saved.mode
            }
            Err(StoreError::NotFound) => LedMode::default(),
            Err(e) => {
                warn!("LED: ignoring stored settings: {e}");
                LedMode::default()
            }
        }
    }
}

fn persist_mode(ctx: &Context, mode: LedMode) {
    if let Some(settings) = ctx.settings.as_ref() {
        if let Err(e) = settings.save(&LedSettings { mode }) {
            warn!("LED: could not persist mode {mode:?}: {e}");
        }
    }
}

#[async_trait]
impl Module for LedModule {
    fn name(&self) -> &str {
        NAME
    }

    fn init(&mut self) -> Result<(), ModuleError> {
        let provider = pin_provider(&self.ctx)?;
        let pin = GpioPin::claim(
            &self.ctx.resources,
            provider.as_ref(),
            LED_PIN,
            PinMode::Output,
            NAME,
        )?;
        self.pin = Some(pin);
        self.animator = Animator::new(self.restore_mode());
        self.commands = Some(self.ctx.bus.subscribe(COMMAND_TOPIC));
        Ok(())
    }

    async fn start(&mut self, token: CancelToken) {
        let (Some(pin), Some(commands)) = (self.pin.as_mut(), self.commands.as_mut()) else {
            return;
        };
        let animator = &mut self.animator;
        let mut frames = tokio::time::interval(FRAME_PERIOD);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("LED: listening on '{COMMAND_TOPIC}' in mode {:?}", animator.mode());

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                evt = commands.recv() => {
                    let Some(evt) = evt else { break };
                    let Some(mode) = LedMode::from_command(evt.value) else {
                        debug!("LED: ignoring command {} from '{}'", evt.value, evt.source);
                        continue;
                    };
                    debug!("LED: mode {mode:?} (from '{}')", evt.source);
                    animator.set_mode(mode);
                    if mode == LedMode::Off {
                        pin.low();
                    }
                    persist_mode(&self.ctx, mode);
                }
                _ = frames.tick() => {
                    let level = animator.next_level(pin.get());
                    pin.set(level);
                }
            }
        }
    }

    fn stop(&mut self) -> Result<(), ModuleError> {
        self.commands = None;
        if let Some(mut pin) = self.pin.take() {
            pin.low();
            pin.close()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_map_to_modes() {
        assert_eq!(LedMode::from_command(1), Some(LedMode::Off));
        assert_eq!(LedMode::from_command(2), Some(LedMode::Heartbeat));
        assert_eq!(LedMode::from_command(3), Some(LedMode::Strobe));
        assert_eq!(LedMode::from_command(42), None);
    }

    #[test]
    fn off_forces_low() {
        let mut animator = Animator::new(LedMode::Off);
        assert!(!animator.next_level(true));
        assert!(!animator.next_level(false));
    }

    #[test]
    fn strobe_toggles_every_second_frame() {
        let mut animator = Animator::new(LedMode::Strobe);
        let mut level = false;
        let mut levels = Vec::new();
        for _ in 0..8 {
            level = animator.next_level(level);
            levels.push(level);
        }
        assert_eq!(levels, vec![false, true, true, false, false, true, true, false]);
    }

    #[test]
    fn heartbeat_has_two_pulses_per_cycle() {
        let mut animator = Animator::new(LedMode::Heartbeat);
        let levels: Vec<bool> = (0..HEARTBEAT_FRAMES)
            .map(|_| animator.next_level(false))
            .collect();
        let rising_edges = levels
            .windows(2)
            .filter(|w| !w[0] && w[1])
            .count();
        assert_eq!(rising_edges, 2);
        assert_eq!(levels.iter().filter(|l| **l).count(), 4);
    }

    #[test]
    fn set_mode_restarts_pattern() {
        let mut animator = Animator::new(LedMode::Strobe);
        animator.next_level(false);
        animator.set_mode(LedMode::Heartbeat);
        assert_eq!(animator.mode(), LedMode::Heartbeat);
        // Frame 1 of a heartbeat is on.
        assert!(animator.next_level(false));
    }
}
