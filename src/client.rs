use std::io::{self, Write};

use anyhow::{bail, Context};
use displayctl_state::{DisplayState, LayoutMode, PendingConfig};

use crate::builder::ConfigBuilder;
use crate::cli::{SegmentArgs, SetArgs, Sub};
use crate::dbus::mutter_display_config::ApplyMethod;
use crate::dbus::{DisplayConfigBus, DisplayConfigManager};
use crate::utils::format_g;

/// Runs a subcommand, calling `connect` once the command line is known to be good.
pub fn run<B: DisplayConfigBus>(
    subcommand: &Sub,
    connect: impl FnOnce() -> anyhow::Result<DisplayConfigManager<B>>,
) -> anyhow::Result<()> {
    match subcommand {
        Sub::List { json } => handle_list(&connect()?, *json),
        Sub::Set(args) => {
            let options = SetOptions::parse(args)?;
            handle_set(&connect()?, &options)
        }
    }
}

pub fn handle_list<B: DisplayConfigBus>(
    manager: &DisplayConfigManager<B>,
    json: bool,
) -> anyhow::Result<()> {
    let state = manager
        .fetch_current_state()
        .context("error getting the current state")?;

    // Only printing is left. Piping into something like `head` closes stdout early, which
    // should end the process quietly rather than make println! panic.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let mut stdout = io::stdout().lock();
    if json {
        let state = serde_json::to_string(&state).context("error formatting state as JSON")?;
        writeln!(stdout, "{state}")?;
    } else {
        print_state(&mut stdout, &state)?;
    }

    Ok(())
}

pub fn handle_set<B: DisplayConfigBus>(
    manager: &DisplayConfigManager<B>,
    options: &SetOptions,
) -> anyhow::Result<()> {
    let state = manager
        .fetch_current_state()
        .context("error getting the current state")?;

    let config = build_config(&state, options)?;

    let layout_mode = config.layout_mode.unwrap_or(state.layout_mode);
    print_pending_config(&mut io::stdout().lock(), &config, layout_mode)?;

    manager.apply(&state, &config, options.method)?;
    info!("applied configuration ({:?})", options.method);

    Ok(())
}

/// `set` options that passed the checks which don't need the current state.
#[derive(Debug)]
pub struct SetOptions {
    segments: Vec<SegmentArgs>,
    pub method: ApplyMethod,
}

impl SetOptions {
    pub fn parse(args: &SetArgs) -> anyhow::Result<Self> {
        let segments = args.segments()?;

        let logical = segments.iter().any(|s| s.logical_layout_mode > 0);
        let physical = segments.iter().any(|s| s.physical_layout_mode > 0);
        if logical && physical {
            bail!("--logical-layout-mode and --physical-layout-mode can't be used together");
        }

        // Verifying never changes anything, so it wins over --persistent.
        let method = if segments.iter().any(|s| s.verify > 0) {
            ApplyMethod::Verify
        } else if segments.iter().any(|s| s.persistent > 0) {
            ApplyMethod::Persistent
        } else {
            ApplyMethod::Temporary
        };

        Ok(Self { segments, method })
    }
}

/// Turns the `set` options into a configuration on top of `state`.
pub fn build_config<'a>(
    state: &'a DisplayState,
    options: &SetOptions,
) -> anyhow::Result<PendingConfig<'a>> {
    let mut builder = ConfigBuilder::new(state);
    for segment in &options.segments {
        apply_segment(&mut builder, segment)?;
    }

    Ok(builder.finish())
}

fn apply_segment(builder: &mut ConfigBuilder<'_>, segment: &SegmentArgs) -> anyhow::Result<()> {
    if segment.starts_logical_monitor() {
        builder.start_logical_monitor()?;
    }

    for x in &segment.x {
        builder.set_x(x)?;
    }
    for y in &segment.y {
        builder.set_y(y)?;
    }
    for scale in &segment.scale {
        builder.set_scale(scale)?;
    }
    if segment.primary > 0 {
        builder.mark_primary()?;
    }
    for connector in &segment.monitors {
        builder.add_monitor(connector)?;
    }

    if segment.logical_layout_mode > 0 {
        builder.set_layout_mode(LayoutMode::Logical);
    } else if segment.physical_layout_mode > 0 {
        builder.set_layout_mode(LayoutMode::Physical);
    }

    Ok(())
}

pub fn print_state(out: &mut impl Write, state: &DisplayState) -> io::Result<()> {
    for monitor in state.monitors() {
        let active = if monitor.is_active() { "ON" } else { "OFF" };
        let builtin = if monitor.is_builtin() { " BUILTIN" } else { "" };
        writeln!(out, "Monitor [ {} ] {active}{builtin}", monitor.connector())?;

        for (idx, mode) in monitor.modes.iter().enumerate() {
            let (width, height) = mode.resolution();
            let refresh = format_g(mode.refresh_rate);
            let scale = format_g(mode.preferred_scale);
            let preferred = if monitor.preferred_mode == Some(idx) {
                " PREFERRED"
            } else {
                ""
            };
            let current = if monitor.current_mode == Some(idx) {
                " CURRENT"
            } else {
                ""
            };
            writeln!(
                out,
                "  {width}x{height}@{refresh} [preferred scale = {scale}]{preferred}{current}"
            )?;
        }
    }

    for logical_monitor in state.logical_monitors() {
        let layout = logical_monitor.layout();
        let primary = if logical_monitor.is_primary() {
            ", PRIMARY"
        } else {
            ""
        };
        writeln!(
            out,
            "Logical monitor [ {}x{}+{}+{} ]{primary}, scale = {}",
            layout.width,
            layout.height,
            layout.x,
            layout.y,
            format_g(logical_monitor.scale()),
        )?;

        for monitor in state.monitors_of(logical_monitor) {
            writeln!(out, "  {}", monitor.connector())?;
        }
    }

    match state.max_screen_size {
        Some(size) => writeln!(out, "Max screen size: {}x{}", size.width, size.height)?,
        None => writeln!(out, "Max screen size: unlimited")?,
    }

    write!(out, "Supported scales:")?;
    for scale in &state.supported_scales {
        write!(out, " {}", format_g(*scale))?;
    }
    writeln!(out)?;

    Ok(())
}

pub fn print_pending_config(
    out: &mut impl Write,
    config: &PendingConfig<'_>,
    layout_mode: LayoutMode,
) -> io::Result<()> {
    for logical_monitor in &config.logical_monitor_configs {
        let layout = logical_monitor.calculate_layout(layout_mode);
        let primary = if logical_monitor.is_primary {
            ", PRIMARY"
        } else {
            ""
        };
        writeln!(
            out,
            "Logical monitor [ {}x{}+{}+{} ]{primary}, scale = {}",
            layout.width,
            layout.height,
            layout.x,
            layout.y,
            format_g(logical_monitor.scale),
        )?;

        for monitor_config in &logical_monitor.monitor_configs {
            let (width, height) = monitor_config.mode.resolution();
            writeln!(
                out,
                "  Monitor [ {} ] {width}x{height}@{}",
                monitor_config.monitor.connector(),
                format_g(monitor_config.mode.refresh_rate),
            )?;
        }
    }

    Ok(())
}
