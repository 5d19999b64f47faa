//! Framework-wide constants.
//!
//! Single source of truth for queue sizes and default paths.

/// Default capacity of every event bus subscriber queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Default framework configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/modus/modus.toml";

/// Default service name reported in logs.
pub const DEFAULT_SERVICE_NAME: &str = "modus";

/// Service locator name under which the firmware image publishes its pin provider.
pub const GPIO_SERVICE: &str = "gpio";
