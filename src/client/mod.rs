//! UI client side: the mirrored state and the control subcommands

pub mod events;
pub mod mirror;
pub mod remote;

use std::time::Duration;

use crate::{
    config::{ClientCommand, Config},
    error::ClientError,
    state::{Command, SettingsUpdate, Snapshot, StartOptions},
};

pub use events::EventStreamParser;
pub use mirror::{MirrorUpdate, StateMirror};
pub use remote::RemoteClient;

impl ClientCommand {
    /// The daemon command a one-shot subcommand sends; `None` for `watch`
    pub fn to_command(&self) -> Option<Command> {
        match self {
            ClientCommand::State => Some(Command::GetState),
            ClientCommand::Start { force_focus } => Some(Command::StartTimer(StartOptions {
                force_focus: *force_focus,
            })),
            ClientCommand::Pause => Some(Command::PauseTimer),
            ClientCommand::Reset => Some(Command::ResetTimer),
            ClientCommand::Settings { focus, rest } => {
                Some(Command::UpdateSettings(SettingsUpdate::new(*focus, *rest)))
            }
            ClientCommand::Toggle => Some(Command::ToggleTimer),
            ClientCommand::Watch { .. } => None,
        }
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    let status = if snapshot.running { "running" } else { "paused" };
    println!(
        "{} {} ({}) [focus {}m / break {}m]",
        snapshot.phase,
        snapshot.clock_face(),
        status,
        snapshot.settings.focus_minutes,
        snapshot.settings.break_minutes
    );
}

fn print_update(update: MirrorUpdate, mirror: &StateMirror) {
    match update {
        MirrorUpdate::Changed => {
            if let Some(snapshot) = mirror.current() {
                print_snapshot(snapshot);
            }
        }
        MirrorUpdate::PlaySound(ended) => println!("{} phase ended", ended),
        MirrorUpdate::Unchanged => {}
    }
}

/// Run a client subcommand against the daemon described by `config`
pub async fn run(config: &Config, command: &ClientCommand) -> Result<(), ClientError> {
    let client = RemoteClient::new(config.base_url());

    match command.to_command() {
        Some(command) => {
            let snapshot = client.send(&command).await?;
            print_snapshot(&snapshot);
        }
        None => {
            let interval = match command {
                ClientCommand::Watch { interval_ms } => Duration::from_millis((*interval_ms).max(100)),
                _ => Duration::from_secs(1),
            };
            client.watch(interval, print_update).await?;
        }
    }
    Ok(())
}
