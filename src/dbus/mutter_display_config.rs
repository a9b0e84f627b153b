//! Wire format of the `org.gnome.Mutter.DisplayConfig` interface.
//!
//! This targets the protocol revision where scales are `d` (float64) everywhere.

use std::collections::HashMap;

use displayctl_state::{
    DisplayState, LayoutMode, LogicalMonitor, LogicalMonitorConfig, Mode, ModeFlags, Monitor,
    MonitorConfig, MonitorSpec, PendingConfig, Rectangle, Size,
};
use serde::{Deserialize, Serialize};
use zbus::dbus_proxy;
use zbus::zvariant::{DeserializeDict, OwnedValue, SerializeDict, Type, Value};

use crate::error::DecodeError;

pub const DESTINATION: &str = "org.gnome.Mutter.DisplayConfig";
pub const PATH: &str = "/org/gnome/Mutter/DisplayConfig";

const LAYOUT_MODE_LOGICAL: u32 = 1;
const LAYOUT_MODE_PHYSICAL: u32 = 2;

#[dbus_proxy(
    interface = "org.gnome.Mutter.DisplayConfig",
    default_service = "org.gnome.Mutter.DisplayConfig",
    default_path = "/org/gnome/Mutter/DisplayConfig"
)]
trait DisplayConfig {
    fn get_current_state(
        &self,
    ) -> zbus::Result<(
        u32,
        Vec<WireMonitor>,
        Vec<WireLogicalMonitor>,
        HashMap<String, OwnedValue>,
    )>;

    fn apply_monitors_config(
        &self,
        serial: u32,
        method: u32,
        logical_monitors: &[ApplyLogicalMonitor],
        properties: &ApplyProperties,
    ) -> zbus::Result<()>;
}

/// `(ssss)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
pub struct WireMonitorSpec {
    pub connector: String,
    pub vendor: String,
    pub product: String,
    pub serial: String,
}

/// `(iiddu)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Type)]
pub struct WireMode {
    pub width: i32,
    pub height: i32,
    pub refresh_rate: f64,
    pub preferred_scale: f64,
    pub flags: u32,
}

/// `((ssss)a(iiddu)a{sv})`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
pub struct WireMonitor {
    pub spec: WireMonitorSpec,
    pub modes: Vec<WireMode>,
    pub properties: HashMap<String, OwnedValue>,
}

/// `(iiiia(ssss)dba{sv})`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
pub struct WireLogicalMonitor {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub monitors: Vec<WireMonitorSpec>,
    pub scale: f64,
    pub is_primary: bool,
    pub properties: HashMap<String, OwnedValue>,
}

/// Reply of `GetCurrentState`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
pub struct CurrentState {
    pub serial: u32,
    pub monitors: Vec<WireMonitor>,
    pub logical_monitors: Vec<WireLogicalMonitor>,
    pub properties: HashMap<String, OwnedValue>,
}

/// `((ssss)sa{sv})`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
pub struct ApplyMonitor {
    pub spec: WireMonitorSpec,
    pub mode_id: String,
    pub properties: HashMap<String, OwnedValue>,
}

/// `(iia((ssss)sa{sv})dba{sv})`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Type)]
pub struct ApplyLogicalMonitor {
    pub x: i32,
    pub y: i32,
    pub monitors: Vec<ApplyMonitor>,
    pub scale: f64,
    pub is_primary: bool,
    pub properties: HashMap<String, OwnedValue>,
}

#[derive(Debug, Clone, Default, PartialEq, SerializeDict, DeserializeDict, Type)]
#[zvariant(signature = "a{sv}")]
pub struct ApplyProperties {
    #[zvariant(rename = "layout-mode")]
    pub layout_mode: Option<u32>,
}

/// How long an applied configuration lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMethod {
    /// Only check that the configuration would be accepted.
    Verify,
    /// Apply for the current session.
    Temporary,
    /// Apply and store as the default for this set of monitors.
    Persistent,
}

impl ApplyMethod {
    pub fn to_wire(self) -> u32 {
        match self {
            ApplyMethod::Verify => 0,
            ApplyMethod::Temporary => 1,
            ApplyMethod::Persistent => 2,
        }
    }
}

impl From<WireMonitorSpec> for MonitorSpec {
    fn from(spec: WireMonitorSpec) -> Self {
        let WireMonitorSpec {
            connector,
            vendor,
            product,
            serial,
        } = spec;

        MonitorSpec {
            connector,
            vendor,
            product,
            serial,
        }
    }
}

impl From<&MonitorSpec> for WireMonitorSpec {
    fn from(spec: &MonitorSpec) -> Self {
        WireMonitorSpec {
            connector: spec.connector.clone(),
            vendor: spec.vendor.clone(),
            product: spec.product.clone(),
            serial: spec.serial.clone(),
        }
    }
}

impl From<WireMode> for Mode {
    fn from(mode: WireMode) -> Self {
        Mode {
            width: mode.width,
            height: mode.height,
            refresh_rate: mode.refresh_rate,
            preferred_scale: mode.preferred_scale,
            flags: ModeFlags::from_bits_truncate(mode.flags),
        }
    }
}

/// Known keys of a monitor's property map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorProperties {
    pub is_builtin: Option<bool>,
    pub display_name: Option<String>,
    pub is_underscanning: Option<bool>,
}

impl MonitorProperties {
    pub fn decode(map: &HashMap<String, OwnedValue>) -> Result<Self, DecodeError> {
        Ok(Self {
            is_builtin: property(map, "is-builtin", as_bool)?,
            display_name: property(map, "display-name", as_string)?,
            is_underscanning: property(map, "is-underscanning", as_bool)?,
        })
    }
}

/// Known keys of the global property map of `GetCurrentState`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateProperties {
    pub max_screen_size: Option<Size>,
    pub supported_scales: Option<Vec<f64>>,
    pub layout_mode: Option<u32>,
    pub supports_changing_layout_mode: Option<bool>,
}

impl StateProperties {
    pub fn decode(map: &HashMap<String, OwnedValue>) -> Result<Self, DecodeError> {
        Ok(Self {
            max_screen_size: property(map, "max-screen-size", as_size)?,
            supported_scales: property(map, "supported-scales", as_f64_array)?,
            layout_mode: property(map, "layout-mode", as_u32)?,
            supports_changing_layout_mode: property(
                map,
                "supports-changing-layout-mode",
                as_bool,
            )?,
        })
    }
}

/// Looks up `key` and converts its value.
///
/// A missing key is `None`. A key holding a value of the wrong type fails the whole decode.
fn property<T>(
    map: &HashMap<String, OwnedValue>,
    key: &'static str,
    convert: fn(&Value<'_>) -> Option<T>,
) -> Result<Option<T>, DecodeError> {
    map.get(key)
        .map(|value| convert(value).ok_or(DecodeError::InvalidProperty { key }))
        .transpose()
}

fn as_bool(value: &Value<'_>) -> Option<bool> {
    match value {
        Value::Bool(value) => Some(*value),
        _ => None,
    }
}

fn as_u32(value: &Value<'_>) -> Option<u32> {
    match value {
        Value::U32(value) => Some(*value),
        _ => None,
    }
}

fn as_string(value: &Value<'_>) -> Option<String> {
    match value {
        Value::Str(value) => Some(value.as_str().to_owned()),
        _ => None,
    }
}

fn as_size(value: &Value<'_>) -> Option<Size> {
    match value {
        Value::Structure(fields) => match fields.fields() {
            [Value::I32(width), Value::I32(height)] => Some(Size {
                width: *width,
                height: *height,
            }),
            _ => None,
        },
        _ => None,
    }
}

fn as_f64_array(value: &Value<'_>) -> Option<Vec<f64>> {
    match value {
        Value::Array(array) if array.element_signature().as_str() == "d" => array
            .get()
            .iter()
            .map(|value| match value {
                Value::F64(value) => Some(*value),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

pub fn decode_layout_mode(value: u32) -> Result<LayoutMode, DecodeError> {
    match value {
        LAYOUT_MODE_LOGICAL => Ok(LayoutMode::Logical),
        LAYOUT_MODE_PHYSICAL => Ok(LayoutMode::Physical),
        other => Err(DecodeError::UnknownLayoutMode(other)),
    }
}

pub fn encode_layout_mode(layout_mode: LayoutMode) -> u32 {
    match layout_mode {
        LayoutMode::Logical => LAYOUT_MODE_LOGICAL,
        LayoutMode::Physical => LAYOUT_MODE_PHYSICAL,
    }
}

/// Returns the id the service uses to refer to a mode of a monitor.
pub fn mode_id(mode: &Mode) -> String {
    format!("{}x{}@{:.3}", mode.width, mode.height, mode.refresh_rate)
}

impl CurrentState {
    /// Builds the in-memory state out of the reply.
    ///
    /// Logical monitors refer to monitors by spec, so all monitors are decoded first. Specs that
    /// don't match any monitor are dropped with a warning.
    pub fn decode(self) -> Result<DisplayState, DecodeError> {
        let CurrentState {
            serial,
            monitors,
            logical_monitors,
            properties,
        } = self;
        let properties = StateProperties::decode(&properties)?;

        let layout_mode = properties
            .layout_mode
            .map(decode_layout_mode)
            .transpose()?
            .unwrap_or_default();

        let monitors = monitors
            .into_iter()
            .map(decode_monitor)
            .collect::<Result<Vec<_>, _>>()?;

        let logical_monitors = logical_monitors
            .into_iter()
            .map(|lm| decode_logical_monitor(&monitors, lm))
            .collect();

        Ok(DisplayState {
            serial,
            monitors,
            logical_monitors,
            max_screen_size: properties.max_screen_size,
            supported_scales: properties.supported_scales.unwrap_or_default(),
            layout_mode,
            supports_changing_layout_mode: properties
                .supports_changing_layout_mode
                .unwrap_or(false),
        })
    }
}

fn decode_monitor(monitor: WireMonitor) -> Result<Monitor, DecodeError> {
    let WireMonitor {
        spec,
        modes: wire_modes,
        properties,
    } = monitor;
    let spec = MonitorSpec::from(spec);
    let properties = MonitorProperties::decode(&properties)?;

    let mut modes = Vec::with_capacity(wire_modes.len());
    let mut current_mode = None;
    let mut preferred_mode = None;

    for (idx, mode) in wire_modes.into_iter().enumerate() {
        let mode = Mode::from(mode);

        // The service should never send more than one of each, keep the first one if it does.
        if mode.is_preferred() {
            if preferred_mode.is_some() {
                warn!("monitor {} has more than one preferred mode", spec.connector);
            } else {
                preferred_mode = Some(idx);
            }
        }

        if mode.is_current() {
            if current_mode.is_some() {
                warn!("monitor {} has more than one current mode", spec.connector);
            } else {
                current_mode = Some(idx);
            }
        }

        modes.push(mode);
    }

    Ok(Monitor {
        spec,
        modes,
        current_mode,
        preferred_mode,
        is_builtin: properties.is_builtin.unwrap_or(false),
        display_name: properties.display_name,
        underscanning: properties.is_underscanning,
    })
}

fn decode_logical_monitor(
    monitors: &[Monitor],
    logical_monitor: WireLogicalMonitor,
) -> LogicalMonitor {
    let mut linked = Vec::with_capacity(logical_monitor.monitors.len());

    for spec in logical_monitor.monitors {
        let spec = MonitorSpec::from(spec);

        let Some(idx) = monitors.iter().position(|m| m.spec == spec) else {
            warn!(
                "couldn't find monitor given spec: {}, {}, {}, {}",
                spec.connector, spec.vendor, spec.product, spec.serial
            );
            continue;
        };

        if !linked.contains(&idx) {
            linked.push(idx);
        }
    }

    LogicalMonitor {
        layout: Rectangle {
            x: logical_monitor.x,
            y: logical_monitor.y,
            width: logical_monitor.width,
            height: logical_monitor.height,
        },
        scale: logical_monitor.scale,
        is_primary: logical_monitor.is_primary,
        monitors: linked,
    }
}

impl From<&MonitorConfig<'_>> for ApplyMonitor {
    fn from(config: &MonitorConfig<'_>) -> Self {
        ApplyMonitor {
            spec: WireMonitorSpec::from(&config.monitor.spec),
            mode_id: mode_id(config.mode),
            properties: HashMap::new(),
        }
    }
}

impl From<&LogicalMonitorConfig<'_>> for ApplyLogicalMonitor {
    fn from(config: &LogicalMonitorConfig<'_>) -> Self {
        ApplyLogicalMonitor {
            x: config.x,
            y: config.y,
            monitors: config
                .monitor_configs
                .iter()
                .map(ApplyMonitor::from)
                .collect(),
            scale: config.scale,
            is_primary: config.is_primary,
            properties: HashMap::new(),
        }
    }
}

/// Encodes a pending config into the `ApplyMonitorsConfig` arguments after the serial and the
/// method.
pub fn encode_pending(config: &PendingConfig<'_>) -> (Vec<ApplyLogicalMonitor>, ApplyProperties) {
    let logical_monitors = config
        .logical_monitor_configs
        .iter()
        .map(ApplyLogicalMonitor::from)
        .collect();

    let properties = ApplyProperties {
        layout_mode: config.layout_mode.map(encode_layout_mode),
    };

    (logical_monitors, properties)
}
