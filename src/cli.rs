use clap::{ArgAction, Args, Parser, Subcommand};

use crate::dbus::mutter_display_config::DESTINATION;
use crate::utils::version;

/// Environment variable overriding the bus name of the display configuration service.
pub const DEST_ENV: &str = "DISPLAYCTL_DEST";

#[derive(Parser)]
#[command(author, version = version(), about, long_about = None)]
#[command(subcommand_value_name = "SUBCOMMAND")]
#[command(subcommand_help_heading = "Subcommands")]
pub struct Cli {
    /// Bus name of the display configuration service (default: `org.gnome.Mutter.DisplayConfig`).
    ///
    /// This can also be set with the `DISPLAYCTL_DEST` environment variable. If both are set, the
    /// command line argument takes precedence.
    #[arg(long, value_name = "NAME")]
    pub dest: Option<String>,

    #[command(subcommand)]
    pub subcommand: Sub,
}

#[derive(Subcommand)]
pub enum Sub {
    /// List current monitors and the current configuration.
    List {
        /// Format output as JSON.
        #[arg(short, long)]
        json: bool,
    },
    /// Build a new configuration and apply it.
    Set(SetArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Options, applied in order.
    ///
    ///   -L, --logical-monitor      Add a logical monitor
    ///   -x, --x X                  Set x position of the last added logical monitor
    ///   -y, --y Y                  Set y position of the last added logical monitor
    ///   -s, --scale SCALE          Set scale of the last added logical monitor
    ///   -p, --primary              Mark the last added logical monitor as primary
    ///   -M, --monitor CONNECTOR    Add a monitor to the last added logical monitor
    ///   -P, --persistent           Store the configuration instead of applying it temporarily
    ///       --verify               Only check whether the configuration would be accepted
    ///       --logical-layout-mode  Switch to the logical layout mode
    ///       --physical-layout-mode Switch to the physical layout mode
    #[arg(
        value_name = "OPTIONS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        verbatim_doc_comment
    )]
    pub args: Vec<String>,
}

/// Options found between two `--logical-monitor` flags.
///
/// Repeated values are kept in order so that each one is validated.
#[derive(Parser, Debug, Default, PartialEq)]
#[command(no_binary_name = true, disable_help_flag = true, disable_version_flag = true)]
pub struct SegmentArgs {
    #[arg(short = 'L', long = "logical-monitor", action = ArgAction::Count)]
    pub logical_monitor: u8,
    #[arg(short = 'x', long = "x", allow_negative_numbers = true)]
    pub x: Vec<String>,
    #[arg(short = 'y', long = "y", allow_negative_numbers = true)]
    pub y: Vec<String>,
    #[arg(short = 's', long = "scale", allow_negative_numbers = true)]
    pub scale: Vec<String>,
    #[arg(short = 'p', long = "primary", action = ArgAction::Count)]
    pub primary: u8,
    #[arg(short = 'M', long = "monitor")]
    pub monitors: Vec<String>,
    #[arg(short = 'P', long = "persistent", action = ArgAction::Count)]
    pub persistent: u8,
    #[arg(long, action = ArgAction::Count)]
    pub verify: u8,
    #[arg(long, action = ArgAction::Count)]
    pub logical_layout_mode: u8,
    #[arg(long, action = ArgAction::Count)]
    pub physical_layout_mode: u8,
}

impl SegmentArgs {
    pub fn starts_logical_monitor(&self) -> bool {
        self.logical_monitor > 0
    }
}

/// Short options that take a value. In a cluster, everything after one of these is its value.
const SHORT_VALUE_OPTIONS: &[char] = &['x', 'y', 's', 'M'];
const LONG_VALUE_OPTIONS: &[&str] = &["--x", "--y", "--scale", "--monitor"];

impl SetArgs {
    /// Splits the options at each `--logical-monitor` and parses every piece.
    ///
    /// Short option clusters are taken apart first, so in `-pL` the `-p` still belongs to the
    /// logical monitor before the new one. Options only ever apply to the logical monitor added
    /// last, so the order inside a piece doesn't matter.
    pub fn segments(&self) -> Result<Vec<SegmentArgs>, clap::Error> {
        let mut pieces: Vec<Vec<String>> = Vec::new();
        let mut expects_value = false;

        for arg in &self.args {
            if expects_value {
                push_option(&mut pieces, arg.clone(), true);
                expects_value = false;
            } else if arg.starts_with("--") {
                expects_value = LONG_VALUE_OPTIONS.contains(&arg.as_str());
                push_option(&mut pieces, arg.clone(), false);
            } else if let Some(cluster) = arg.strip_prefix('-').filter(|c| !c.is_empty()) {
                for (idx, c) in cluster.char_indices() {
                    if SHORT_VALUE_OPTIONS.contains(&c) {
                        let rest = &cluster[idx..];
                        expects_value = rest.len() == c.len_utf8();
                        push_option(&mut pieces, format!("-{rest}"), false);
                        break;
                    }
                    push_option(&mut pieces, format!("-{c}"), false);
                }
            } else {
                push_option(&mut pieces, arg.clone(), false);
            }
        }

        pieces
            .into_iter()
            .map(SegmentArgs::try_parse_from)
            .collect()
    }
}

fn push_option(pieces: &mut Vec<Vec<String>>, arg: String, is_value: bool) {
    let starts_piece = !is_value && (arg == "-L" || arg == "--logical-monitor");

    if !starts_piece {
        if let Some(piece) = pieces.last_mut() {
            piece.push(arg);
            return;
        }
    }
    pieces.push(vec![arg]);
}

/// Picks the bus name to talk to, the command line first, then the environment.
pub fn resolve_destination(arg: Option<String>, env: Option<String>) -> String {
    arg.or_else(|| env.filter(|dest| !dest.is_empty()))
        .unwrap_or_else(|| DESTINATION.to_owned())
}
