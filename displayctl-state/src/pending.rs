//! Configuration under construction, to be applied on top of a [`DisplayState`].
//!
//! Pending configs borrow the snapshot they were built from: a [`MonitorConfig`] points at a
//! [`Monitor`] and one of its [`Mode`]s inside that snapshot.
//!
//! [`DisplayState`]: crate::DisplayState

use crate::{LayoutMode, Mode, Monitor, Rectangle};

/// A monitor together with the mode it should use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig<'a> {
    /// The monitor.
    pub monitor: &'a Monitor,
    /// One of the monitor's modes.
    pub mode: &'a Mode,
}

/// A logical monitor to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalMonitorConfig<'a> {
    /// X position in the global coordinate space.
    pub x: i32,
    /// Y position in the global coordinate space.
    pub y: i32,
    /// Scale factor.
    pub scale: f64,
    /// Whether this logical monitor should become the primary one.
    pub is_primary: bool,
    /// Monitors showing this logical monitor, in the order they were added.
    pub monitor_configs: Vec<MonitorConfig<'a>>,
}

impl Default for LogicalMonitorConfig<'_> {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            scale: 1.,
            is_primary: false,
            monitor_configs: Vec::new(),
        }
    }
}

impl LogicalMonitorConfig<'_> {
    /// Computes the rectangle this logical monitor will occupy.
    ///
    /// The size comes from the mode of the first monitor; mirrored monitors are expected to use
    /// modes of the same resolution. In logical layout mode the size is divided by the scale.
    pub fn calculate_layout(&self, layout_mode: LayoutMode) -> Rectangle {
        let (width, height) = self
            .monitor_configs
            .first()
            .map_or((0, 0), |config| config.mode.resolution());

        let (width, height) = match layout_mode {
            LayoutMode::Logical => (
                (f64::from(width) / self.scale).round() as i32,
                (f64::from(height) / self.scale).round() as i32,
            ),
            LayoutMode::Physical => (width, height),
        };

        Rectangle {
            x: self.x,
            y: self.y,
            width,
            height,
        }
    }
}

/// A whole configuration to be applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PendingConfig<'a> {
    /// Layout mode to switch to, if any.
    pub layout_mode: Option<LayoutMode>,
    /// Logical monitors, in the order they were finalized.
    pub logical_monitor_configs: Vec<LogicalMonitorConfig<'a>>,
}
