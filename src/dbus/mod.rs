use displayctl_state::{DisplayState, PendingConfig};
use zbus::fdo;

use crate::error::{ApplyError, DecodeError, FetchError};

pub mod mutter_display_config;

use self::mutter_display_config::{
    encode_pending, ApplyLogicalMonitor, ApplyMethod, ApplyProperties, CurrentState,
    DisplayConfigProxyBlocking, PATH,
};

/// The two calls of the display configuration interface that we use.
pub trait DisplayConfigBus {
    fn current_state(&self) -> zbus::Result<CurrentState>;

    fn apply_config(
        &self,
        serial: u32,
        method: u32,
        logical_monitors: &[ApplyLogicalMonitor],
        properties: &ApplyProperties,
    ) -> zbus::Result<()>;
}

impl DisplayConfigBus for DisplayConfigProxyBlocking<'_> {
    fn current_state(&self) -> zbus::Result<CurrentState> {
        let (serial, monitors, logical_monitors, properties) = self.get_current_state()?;
        Ok(CurrentState {
            serial,
            monitors,
            logical_monitors,
            properties,
        })
    }

    fn apply_config(
        &self,
        serial: u32,
        method: u32,
        logical_monitors: &[ApplyLogicalMonitor],
        properties: &ApplyProperties,
    ) -> zbus::Result<()> {
        self.apply_monitors_config(serial, method, logical_monitors, properties)
    }
}

/// Owns the connection to the display configuration service.
pub struct DisplayConfigManager<B = DisplayConfigProxyBlocking<'static>> {
    bus: B,
}

impl DisplayConfigManager {
    /// Connects to the service at `destination` on the session bus.
    pub fn connect(destination: &str) -> zbus::Result<Self> {
        let _span = tracing::debug_span!("DisplayConfigManager::connect").entered();

        let conn = zbus::blocking::Connection::session()?;
        let proxy = DisplayConfigProxyBlocking::builder(&conn)
            .destination(destination.to_owned())?
            .path(PATH)?
            .cache_properties(zbus::CacheProperties::No)
            .build()?;

        debug!("connected to {destination}");
        Ok(Self::with_bus(proxy))
    }
}

impl<B: DisplayConfigBus> DisplayConfigManager<B> {
    pub fn with_bus(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Fetches and decodes the current state in one blocking round trip.
    pub fn fetch_current_state(&self) -> Result<DisplayState, FetchError> {
        let reply = self.bus.current_state().map_err(|err| match err {
            zbus::Error::Variant(_) => FetchError::Decode(DecodeError::Payload(err)),
            err => FetchError::Transport(err),
        })?;

        let state = reply.decode()?;
        debug!(
            "fetched state with serial {}: {} monitors, {} logical monitors",
            state.serial,
            state.monitors.len(),
            state.logical_monitors.len()
        );

        Ok(state)
    }

    /// Applies a configuration built on top of `base`.
    ///
    /// The serial of `base` is sent along, so the service refuses the configuration if the state
    /// changed in the meantime. That case is reported as [`ApplyError::StaleSerial`].
    pub fn apply(
        &self,
        base: &DisplayState,
        config: &PendingConfig<'_>,
        method: ApplyMethod,
    ) -> Result<(), ApplyError> {
        let (logical_monitors, properties) = encode_pending(config);

        debug!(
            "applying {} logical monitors on top of serial {} ({method:?})",
            logical_monitors.len(),
            base.serial
        );

        self.bus
            .apply_config(
                base.serial,
                method.to_wire(),
                &logical_monitors,
                &properties,
            )
            .map_err(|err| classify_apply_error(err, base.serial))
    }
}

fn classify_apply_error(err: zbus::Error, serial: u32) -> ApplyError {
    let (name, reason) = match &err {
        zbus::Error::MethodError(name, reason, _) => {
            (name.as_str().to_owned(), reason.clone().unwrap_or_default())
        }
        zbus::Error::FDO(fdo_err) => match &**fdo_err {
            fdo::Error::AccessDenied(reason) => (error_name("AccessDenied"), reason.clone()),
            fdo::Error::InvalidArgs(reason) => (error_name("InvalidArgs"), reason.clone()),
            fdo::Error::NotSupported(reason) => (error_name("NotSupported"), reason.clone()),
            fdo::Error::Failed(reason) => (error_name("Failed"), reason.clone()),
            _ => return ApplyError::Transport(err),
        },
        _ => return ApplyError::Transport(err),
    };

    let Some(kind) = name.strip_prefix("org.freedesktop.DBus.Error.") else {
        // Errors specific to the service are always about the configuration.
        return ApplyError::Rejected(reason);
    };

    match kind {
        "AccessDenied" if reason.to_lowercase().contains("stale") => {
            ApplyError::StaleSerial { serial, reason }
        }
        "AccessDenied" | "InvalidArgs" | "NotSupported" | "Failed" => ApplyError::Rejected(reason),
        _ => ApplyError::Transport(err),
    }
}

fn error_name(kind: &str) -> String {
    format!("org.freedesktop.DBus.Error.{kind}")
}
