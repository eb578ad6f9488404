//! Entry point for the **viewgrid** daemon.
//!
//! Spawns the Unix-socket [`CommandSource`](viewgrid::traits::CommandSource)
//! on a background thread and processes incoming commands on the main
//! thread, which is the only owner of the layout.
//!
//! Flags:
//!
//! * `--config <path>` — config file (default
//!   `$XDG_CONFIG_HOME/viewgrid/config.json`)
//! * `--socket <path>` — override the command socket path
//! * `--print-events` — write every layout event to stdout as one JSON line

use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::mpsc;
use viewgrid::command::{Command, ViewportId};
use viewgrid::config::Config;
use viewgrid::ipc::listener::UnixSocketListener;
use viewgrid::traits::{CommandSource, LayoutEvent, ViewportHost};
use viewgrid::workspace::WorkspaceController;

//  Logging host

/// A [`ViewportHost`] that only logs what it would render.
///
/// Rendering belongs to the UI shell; the daemon reports layout changes
/// through `--print-events` instead.
struct LogHost;

#[derive(Debug, thiserror::Error)]
#[error("log host error")]
struct LogHostError;

impl ViewportHost for LogHost {
    type Error = LogHostError;

    fn show_tab(&self, tab_index: usize, viewports: &[ViewportId]) -> Result<(), LogHostError> {
        let names: Vec<&str> = viewports.iter().map(ViewportId::as_str).collect();
        info!("tab {}: [{}]", tab_index, names.join(", "));
        Ok(())
    }

    fn update_tab_strip(&self, tab_count: usize, active: usize) -> Result<(), LogHostError> {
        info!("tab strip: {} tab(s), active {}", tab_count, active);
        Ok(())
    }

    fn release_viewport(&self, id: &ViewportId) -> Result<(), LogHostError> {
        info!("release {}", id);
        Ok(())
    }
}

//  Arguments

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    socket: Option<PathBuf>,
    print_events: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--socket" => args.socket = it.next().map(PathBuf::from),
            "--print-events" => args.print_events = true,
            other => warn!("ignoring unknown argument {:?}", other),
        }
    }
    args
}

/// Load the config from `--config` or the default location.
///
/// An explicit path must load; the default location falls back to
/// compiled-in defaults.
fn load_config(explicit: Option<PathBuf>) -> Config {
    match explicit {
        Some(path) => match Config::load(&path) {
            Ok(cfg) => {
                info!("loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        None => {
            let path = Config::default_path();
            match Config::load(&path) {
                Ok(cfg) => {
                    info!("loaded config from {}", path.display());
                    cfg
                }
                Err(e) => {
                    info!("no usable config file ({}), using defaults", e);
                    Config::default()
                }
            }
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let args = parse_args();
    let config = load_config(args.config);
    let socket = args
        .socket
        .unwrap_or_else(|| config.listener.socket_path());

    let mut workspace = match WorkspaceController::new(LogHost, config.grid) {
        Ok(ws) => ws,
        Err(e) => {
            error!("invalid grid: {}", e);
            std::process::exit(1);
        }
    };
    let shape = workspace.grid().config();
    info!(
        "grid {}x{} ({} viewport(s) per tab)",
        shape.columns,
        shape.rows,
        workspace.grid().capacity()
    );

    if args.print_events {
        workspace.set_observer(spawn_event_printer());
    }

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    spawn_command_sources(cmd_tx, socket);

    info!("viewgrid running");
    for cmd in cmd_rx {
        if let Err(e) = workspace.handle(cmd) {
            error!("command error: {}", e);
        }
    }
    info!("all command sources closed, exiting");
}

//  Helpers

fn spawn_command_sources(tx: mpsc::Sender<Command>, socket: PathBuf) {
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&socket);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}

/// Forward layout events to stdout, one JSON object per line.
fn spawn_event_printer() -> mpsc::Sender<LayoutEvent> {
    let (tx, rx) = mpsc::channel::<LayoutEvent>();
    std::thread::spawn(move || {
        for event in rx {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("could not encode {:?}: {}", event, e),
            }
        }
    });
    tx
}
