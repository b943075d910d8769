//! Device domain entity (washing machine / dryer)

use chrono::Duration;

/// A metered laundry machine.
///
/// A device hosts at most one running execution at a time; the lifecycle
/// service asserts this on start.
#[derive(Debug, Clone)]
pub struct Device {
    pub id: i32,
    pub name: String,
    /// Location name shown in operator displays
    pub location: String,
    /// Power draw below which the auto-end countdown starts (watts)
    pub auto_end_power_threshold: f32,
    /// How long power must stay below the threshold before auto-end fires
    pub auto_end_wait_time: Duration,
    pub enabled: bool,
}

impl Device {
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.location)
    }
}
