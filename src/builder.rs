//! Incremental construction of a [`PendingConfig`] from command line options.
//!
//! At most one logical monitor is in progress at a time. Options that change a logical monitor
//! apply to the one in progress, and starting a new one finalizes the previous one.

use displayctl_state::{
    DisplayState, LayoutMode, LogicalMonitorConfig, MonitorConfig, PendingConfig,
};

use crate::error::BuilderError;

pub struct ConfigBuilder<'a> {
    state: &'a DisplayState,
    config: PendingConfig<'a>,
    pending: Option<LogicalMonitorConfig<'a>>,
}

impl<'a> ConfigBuilder<'a> {
    pub fn new(state: &'a DisplayState) -> Self {
        Self {
            state,
            config: PendingConfig::default(),
            pending: None,
        }
    }

    pub fn start_logical_monitor(&mut self) -> Result<(), BuilderError> {
        if self.pending.is_some() {
            self.finalize_pending()?;
        }

        self.pending = Some(LogicalMonitorConfig::default());
        Ok(())
    }

    fn finalize_pending(&mut self) -> Result<(), BuilderError> {
        let logical_monitor = self
            .pending
            .take()
            .ok_or(BuilderError::NoPendingLogicalMonitor {
                option: "--logical-monitor",
            })?;

        trace!("finalized logical monitor: {logical_monitor:?}");
        self.config.logical_monitor_configs.push(logical_monitor);
        Ok(())
    }

    fn pending_mut(
        &mut self,
        option: &'static str,
    ) -> Result<&mut LogicalMonitorConfig<'a>, BuilderError> {
        self.pending
            .as_mut()
            .ok_or(BuilderError::NoPendingLogicalMonitor { option })
    }

    pub fn set_x(&mut self, value: &str) -> Result<(), BuilderError> {
        let pending = self.pending_mut("--x")?;
        pending.x = parse_coordinate("x", value)?;
        Ok(())
    }

    pub fn set_y(&mut self, value: &str) -> Result<(), BuilderError> {
        let pending = self.pending_mut("--y")?;
        pending.y = parse_coordinate("y", value)?;
        Ok(())
    }

    pub fn set_scale(&mut self, value: &str) -> Result<(), BuilderError> {
        let pending = self.pending_mut("--scale")?;
        pending.scale = parse_scale(value)?;
        Ok(())
    }

    pub fn mark_primary(&mut self) -> Result<(), BuilderError> {
        self.pending_mut("--primary")?.is_primary = true;
        Ok(())
    }

    /// Adds the monitor with this connector to the logical monitor in progress.
    ///
    /// The monitor always gets its preferred mode, regardless of the mode it currently uses.
    pub fn add_monitor(&mut self, connector: &str) -> Result<(), BuilderError> {
        let state = self.state;
        let pending = self.pending_mut("--monitor")?;

        let monitor = state
            .monitor_by_connector(connector)
            .ok_or_else(|| BuilderError::UnknownMonitor(connector.to_owned()))?;
        let mode = monitor
            .preferred_mode()
            .ok_or_else(|| BuilderError::NoPreferredMode(connector.to_owned()))?;

        pending.monitor_configs.push(MonitorConfig { monitor, mode });
        Ok(())
    }

    pub fn set_layout_mode(&mut self, layout_mode: LayoutMode) {
        if !self.state.supports_changing_layout_mode && layout_mode != self.state.layout_mode {
            warn!("the service does not support changing the layout mode");
        }

        self.config.layout_mode = Some(layout_mode);
    }

    /// Finalizes the logical monitor in progress, if any, and returns the whole configuration.
    ///
    /// A configuration without logical monitors is returned as is; the service decides whether
    /// to accept it.
    pub fn finish(mut self) -> PendingConfig<'a> {
        if let Some(logical_monitor) = self.pending.take() {
            self.config.logical_monitor_configs.push(logical_monitor);
        }

        self.config
    }
}

fn parse_coordinate(option: &'static str, value: &str) -> Result<i32, BuilderError> {
    value
        .parse()
        .map_err(|_| BuilderError::InvalidNumericArgument {
            option,
            value: value.to_owned(),
        })
}

fn parse_scale(value: &str) -> Result<f64, BuilderError> {
    // str::parse::<f64>() does not depend on the locale.
    match value.parse::<f64>() {
        Ok(scale) if scale.is_finite() && scale > 0. => Ok(scale),
        _ => Err(BuilderError::InvalidNumericArgument {
            option: "scale",
            value: value.to_owned(),
        }),
    }
}
