//! Types describing the monitor topology reported by the display configuration service.
//!
//! A [`DisplayState`] is a snapshot of one `GetCurrentState` reply. It owns every [`Monitor`]
//! (and through them every [`Mode`]) and every [`LogicalMonitor`]. Logical monitors refer to
//! their physical monitors by index into [`DisplayState::monitors`], so the snapshot can be
//! moved and dropped as a unit.
//!
//! The types in [`pending`] describe a configuration under construction, to be applied on top
//! of a snapshot.
#![warn(missing_docs)]

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub mod pending;

pub use pending::{LogicalMonitorConfig, MonitorConfig, PendingConfig};

/// Identity of a physical monitor: connector, vendor, product and serial.
///
/// The same spec is used to refer to a monitor from a logical monitor, and two monitors are the
/// same monitor exactly when all four strings are equal.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct MonitorSpec {
    /// Name of the video output port, for example `DP-1`.
    pub connector: String,
    /// Vendor name, usually the PNP id from the EDID.
    pub vendor: String,
    /// Product name.
    pub product: String,
    /// Serial number.
    pub serial: String,
}

impl MonitorSpec {
    /// Creates a spec from its four parts.
    pub fn new(
        connector: impl Into<String>,
        vendor: impl Into<String>,
        product: impl Into<String>,
        serial: impl Into<String>,
    ) -> Self {
        Self {
            connector: connector.into(),
            vendor: vendor.into(),
            product: product.into(),
            serial: serial.into(),
        }
    }
}

bitflags! {
    /// Flags attached to a monitor mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ModeFlags: u32 {
        /// The mode is the one preferred by the monitor.
        const PREFERRED = 1 << 0;
        /// The mode is currently in use.
        const CURRENT = 1 << 1;
    }
}

/// Monitor mode.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Mode {
    /// Width in physical pixels.
    pub width: i32,
    /// Height in physical pixels.
    pub height: i32,
    /// Refresh rate in hertz.
    pub refresh_rate: f64,
    /// Scale the service would pick for this mode.
    pub preferred_scale: f64,
    /// Mode flags as sent by the service.
    pub flags: ModeFlags,
}

impl Mode {
    /// Returns the resolution as `(width, height)`.
    pub fn resolution(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// Whether the mode carries the [`ModeFlags::CURRENT`] flag.
    pub fn is_current(&self) -> bool {
        self.flags.contains(ModeFlags::CURRENT)
    }

    /// Whether the mode carries the [`ModeFlags::PREFERRED`] flag.
    pub fn is_preferred(&self) -> bool {
        self.flags.contains(ModeFlags::PREFERRED)
    }
}

/// Physical monitor.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Monitor {
    /// Identity of the monitor.
    pub spec: MonitorSpec,
    /// Modes supported by the monitor, in the order the service listed them.
    pub modes: Vec<Mode>,
    /// Index of the current mode in [`Self::modes`].
    ///
    /// `None` if the monitor is not active.
    pub current_mode: Option<usize>,
    /// Index of the preferred mode in [`Self::modes`], if the monitor has one.
    pub preferred_mode: Option<usize>,
    /// Whether this is the built-in panel of a laptop or similar device.
    pub is_builtin: bool,
    /// Human-readable name, if the service provided one.
    pub display_name: Option<String>,
    /// Underscanning state.
    ///
    /// `None` if the monitor does not support underscanning.
    pub underscanning: Option<bool>,
}

impl Monitor {
    /// Returns the connector name.
    pub fn connector(&self) -> &str {
        &self.spec.connector
    }

    /// Whether the monitor is lit, that is, has a current mode.
    pub fn is_active(&self) -> bool {
        self.current_mode.is_some()
    }

    /// Returns the current mode.
    pub fn current_mode(&self) -> Option<&Mode> {
        self.current_mode.and_then(|idx| self.modes.get(idx))
    }

    /// Returns the preferred mode.
    pub fn preferred_mode(&self) -> Option<&Mode> {
        self.preferred_mode.and_then(|idx| self.modes.get(idx))
    }

    /// Whether this is the built-in display.
    pub fn is_builtin(&self) -> bool {
        self.is_builtin
    }

    /// Whether the monitor supports underscanning.
    pub fn supports_underscanning(&self) -> bool {
        self.underscanning.is_some()
    }

    /// Whether underscanning is currently enabled.
    pub fn is_underscanning(&self) -> bool {
        self.underscanning.unwrap_or(false)
    }
}

/// Axis-aligned rectangle in the global coordinate space.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rectangle {
    /// X coordinate of the top-left corner.
    pub x: i32,
    /// Y coordinate of the top-left corner.
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

/// Width and height.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

/// How logical monitor sizes relate to the modes of their monitors.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// The logical monitor size is the mode size divided by the scale.
    #[default]
    Logical,
    /// The logical monitor size is the mode size.
    Physical,
}

/// Positioned, scaled rectangle mapped to one or more physical monitors.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LogicalMonitor {
    /// Position and size in the global coordinate space.
    pub layout: Rectangle,
    /// Scale factor.
    pub scale: f64,
    /// Whether this is the primary logical monitor.
    pub is_primary: bool,
    /// Indices into [`DisplayState::monitors`] of the monitors showing this logical monitor.
    ///
    /// Several monitors means they mirror each other.
    pub monitors: Vec<usize>,
}

impl LogicalMonitor {
    /// Returns the position and size.
    pub fn layout(&self) -> Rectangle {
        self.layout
    }

    /// Returns the scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Whether this is the primary logical monitor.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }
}

/// Snapshot of the whole display configuration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DisplayState {
    /// Generation token of this snapshot.
    ///
    /// A configuration applied on top of this snapshot must carry the same serial, otherwise
    /// the service rejects it as stale.
    pub serial: u32,
    /// Physical monitors, in the order the service listed them.
    pub monitors: Vec<Monitor>,
    /// Logical monitors, in the order the service listed them.
    pub logical_monitors: Vec<LogicalMonitor>,
    /// Maximum size of the whole screen.
    ///
    /// `None` means there is no limit.
    pub max_screen_size: Option<Size>,
    /// Scales the service accepts for logical monitors.
    pub supported_scales: Vec<f64>,
    /// Layout mode currently in effect.
    pub layout_mode: LayoutMode,
    /// Whether a configuration may select a different layout mode.
    pub supports_changing_layout_mode: bool,
}

impl DisplayState {
    /// Returns the physical monitors.
    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    /// Returns the logical monitors.
    pub fn logical_monitors(&self) -> &[LogicalMonitor] {
        &self.logical_monitors
    }

    /// Finds the index of the monitor with exactly this spec.
    pub fn monitor_index_by_spec(&self, spec: &MonitorSpec) -> Option<usize> {
        self.monitors.iter().position(|m| m.spec == *spec)
    }

    /// Finds the monitor with exactly this spec.
    pub fn monitor_by_spec(&self, spec: &MonitorSpec) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.spec == *spec)
    }

    /// Finds a monitor by its connector name.
    ///
    /// The comparison is exact and case-sensitive.
    pub fn monitor_by_connector(&self, connector: &str) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.connector() == connector)
    }

    /// Returns the monitors showing a logical monitor.
    pub fn monitors_of<'a>(
        &'a self,
        logical_monitor: &'a LogicalMonitor,
    ) -> impl Iterator<Item = &'a Monitor> + 'a {
        logical_monitor
            .monitors
            .iter()
            .filter_map(|&idx| self.monitors.get(idx))
    }

    /// Returns the logical monitor a monitor belongs to.
    pub fn logical_monitor_for(&self, monitor: &Monitor) -> Option<&LogicalMonitor> {
        let idx = self.monitor_index_by_spec(&monitor.spec)?;
        self.logical_monitors
            .iter()
            .find(|lm| lm.monitors.contains(&idx))
    }

    /// Returns the first logical monitor marked as primary.
    pub fn primary_logical_monitor(&self) -> Option<&LogicalMonitor> {
        self.logical_monitors.iter().find(|lm| lm.is_primary)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn mode(width: i32, height: i32, flags: ModeFlags) -> Mode {
        Mode {
            width,
            height,
            refresh_rate: 60.,
            preferred_scale: 1.,
            flags,
        }
    }

    fn state() -> DisplayState {
        let laptop = Monitor {
            spec: MonitorSpec::new("eDP-1", "BOE", "0x0bca", "0x00000000"),
            modes: vec![
                mode(2256, 1504, ModeFlags::PREFERRED | ModeFlags::CURRENT),
                mode(1920, 1200, ModeFlags::empty()),
            ],
            current_mode: Some(0),
            preferred_mode: Some(0),
            is_builtin: true,
            display_name: Some(String::from("Built-in display")),
            underscanning: None,
        };
        let external = Monitor {
            spec: MonitorSpec::new("DP-1", "DEL", "DELL U2720Q", "ABC123"),
            modes: vec![mode(3840, 2160, ModeFlags::PREFERRED)],
            current_mode: None,
            preferred_mode: Some(0),
            is_builtin: false,
            display_name: None,
            underscanning: Some(false),
        };

        DisplayState {
            serial: 7,
            monitors: vec![laptop, external],
            logical_monitors: vec![LogicalMonitor {
                layout: Rectangle {
                    x: 0,
                    y: 0,
                    width: 1504,
                    height: 1003,
                },
                scale: 1.5,
                is_primary: true,
                monitors: vec![0],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn monitor_queries() {
        let state = state();
        let laptop = &state.monitors[0];
        let external = &state.monitors[1];

        assert!(laptop.is_active());
        assert!(!external.is_active());
        assert_eq!(laptop.current_mode().map(Mode::resolution), Some((2256, 1504)));
        assert_eq!(external.current_mode(), None);
        assert_eq!(
            external.preferred_mode().map(Mode::resolution),
            Some((3840, 2160))
        );

        assert!(!laptop.supports_underscanning());
        assert!(external.supports_underscanning());
        assert!(!external.is_underscanning());
    }

    #[test]
    fn lookups() {
        let state = state();

        let spec = MonitorSpec::new("DP-1", "DEL", "DELL U2720Q", "ABC123");
        assert_eq!(state.monitor_index_by_spec(&spec), Some(1));

        // Every part of the spec has to match.
        let spec = MonitorSpec::new("DP-1", "DEL", "DELL U2720Q", "other");
        assert_eq!(state.monitor_by_spec(&spec), None);

        assert!(state.monitor_by_connector("eDP-1").is_some());
        assert!(state.monitor_by_connector("edp-1").is_none());
    }

    #[test]
    fn logical_monitor_links() {
        let state = state();
        let lm = &state.logical_monitors[0];

        let connectors: Vec<_> = state.monitors_of(lm).map(Monitor::connector).collect();
        assert_eq!(connectors, ["eDP-1"]);

        assert_eq!(state.logical_monitor_for(&state.monitors[0]), Some(lm));
        assert_eq!(state.logical_monitor_for(&state.monitors[1]), None);
        assert_eq!(state.primary_logical_monitor(), Some(lm));
    }

    #[test]
    fn mode_flags_serialize_by_name() {
        let flags = ModeFlags::PREFERRED | ModeFlags::CURRENT;
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, r#""PREFERRED | CURRENT""#);
    }
}
