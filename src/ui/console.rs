//! Line-oriented console standing in for a control panel
//!
//! Reads commands from stdin and prints feedback changes to stdout. Logs go
//! to stderr, so the two streams do not mix.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bridge::{Bridge, BridgeCommand};
use crate::config::Config;
use crate::host::{ConnectionStatus, PanelHost};
use crate::surface::{ActionDefinition, ActionId, Choice, FeedbackDefinition, PresetDefinition};

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Help,
    Groups,
    Status,
    Action { action: ActionId, target: String },
    Watch { target: String },
    Unwatch { feedback_id: String },
    Reload,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("empty command".to_string());
        };
        let rest: Vec<&str> = words.collect();
        let argument = || {
            if rest.is_empty() {
                Err(format!("{} needs a group", verb))
            } else {
                Ok(rest.join(" "))
            }
        };

        match verb {
            "help" | "?" => Ok(ConsoleCommand::Help),
            "groups" | "ls" => Ok(ConsoleCommand::Groups),
            "status" => Ok(ConsoleCommand::Status),
            "play" => Ok(ConsoleCommand::Action { action: ActionId::PlayGroup, target: argument()? }),
            "stop" => Ok(ConsoleCommand::Action { action: ActionId::StopGroup, target: argument()? }),
            "pause" => Ok(ConsoleCommand::Action { action: ActionId::PauseGroup, target: argument()? }),
            "watch" => Ok(ConsoleCommand::Watch { target: argument()? }),
            "unwatch" => Ok(ConsoleCommand::Unwatch { feedback_id: argument()? }),
            "reload" => Ok(ConsoleCommand::Reload),
            "quit" | "exit" => Ok(ConsoleCommand::Quit),
            other => Err(format!("unknown command {:?}, try \"help\"", other)),
        }
    }
}

/// Re-reads the configuration for the `reload` command
pub type ConfigLoader = Box<dyn Fn() -> anyhow::Result<Config> + Send>;

/// Hand a freshly loaded configuration to the engine, which validates it
fn reload_request(load: &ConfigLoader) -> Option<BridgeCommand> {
    match load() {
        Ok(config) => {
            info!("Configuration reloaded");
            Some(BridgeCommand::ConfigUpdated(config))
        }
        Err(e) => {
            println!("Reload failed: {:#}", e);
            None
        }
    }
}

/// Host printing to the terminal
///
/// Feedback re-checks are forwarded to [`run_console`], which evaluates them
/// against the bridge.
pub struct ConsoleHost {
    groups: Mutex<Vec<Choice>>,
    checks_tx: mpsc::UnboundedSender<Vec<String>>,
}

impl ConsoleHost {
    pub fn new(checks_tx: mpsc::UnboundedSender<Vec<String>>) -> Self {
        Self {
            groups: Mutex::new(Vec::new()),
            checks_tx,
        }
    }

    fn groups(&self) -> Vec<Choice> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Accept a 1-based index from `groups` as well as a composed id
    fn resolve(&self, target: &str) -> String {
        let groups = self.groups();
        target
            .parse::<usize>()
            .ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| groups.get(index))
            .map(|choice| choice.id.clone())
            .unwrap_or_else(|| target.to_string())
    }
}

impl PanelHost for ConsoleHost {
    fn update_status(&self, status: ConnectionStatus, message: Option<&str>) {
        match status {
            ConnectionStatus::Ok => info!("Connected to SuperConductor"),
            ConnectionStatus::ConnectionFailure => {
                warn!("Connection failure: {}", message.unwrap_or("unknown error"))
            }
        }
    }

    fn set_action_definitions(&self, actions: &[ActionDefinition]) {
        let choices = actions
            .first()
            .and_then(|action| action.options.first())
            .map(|option| option.choices.clone())
            .unwrap_or_default();
        debug!("{} actions over {} groups", actions.len(), choices.len());
        *self.groups.lock().unwrap_or_else(PoisonError::into_inner) = choices;
    }

    fn set_feedback_definitions(&self, feedbacks: &[FeedbackDefinition]) {
        debug!("{} feedbacks defined", feedbacks.len());
    }

    fn set_preset_definitions(&self, presets: &[PresetDefinition]) {
        info!("{} group presets available", presets.len());
    }

    fn check_feedbacks_by_id(&self, feedback_ids: &[String]) {
        let _ = self.checks_tx.send(feedback_ids.to_vec());
    }
}

/// Drive the bridge from stdin until `quit`, EOF or shutdown
pub async fn run_console(
    bridge: Bridge,
    host: std::sync::Arc<ConsoleHost>,
    cmd_tx: mpsc::Sender<BridgeCommand>,
    mut checks_rx: mpsc::UnboundedReceiver<Vec<String>>,
    load_config: ConfigLoader,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = bridge.shutdown_token();
    // feedback id -> watched group
    let mut watches: HashMap<String, String> = HashMap::new();
    let mut last_values: HashMap<String, bool> = HashMap::new();

    println!("Type \"help\" for commands.");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            Some(feedback_ids) = checks_rx.recv() => {
                for feedback_id in feedback_ids {
                    let Some(group) = watches.get(&feedback_id) else {
                        continue;
                    };
                    let playing = bridge.evaluate_feedback(Some(group.as_str()));
                    if last_values.insert(feedback_id.clone(), playing) != Some(playing) {
                        println!(
                            "[{}] {} {}",
                            feedback_id,
                            group,
                            if playing { "PLAYING" } else { "not playing" }
                        );
                    }
                }
            }

            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let command = match ConsoleCommand::parse(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message);
                        continue;
                    }
                };

                let request = match command {
                    ConsoleCommand::Help => {
                        print_commands();
                        None
                    }
                    ConsoleCommand::Groups => {
                        let groups = host.groups();
                        if groups.is_empty() {
                            println!("No groups known yet.");
                        }
                        for (index, choice) in groups.iter().enumerate() {
                            println!("{:>3}  {:<40} {}", index + 1, choice.label, choice.id);
                        }
                        None
                    }
                    ConsoleCommand::Status => {
                        println!("Watched groups: {:?}", bridge.active_groups());
                        for (feedback_id, group) in &watches {
                            println!(
                                "  [{}] {} {}",
                                feedback_id,
                                group,
                                if bridge.evaluate_feedback(Some(group.as_str())) { "PLAYING" } else { "not playing" }
                            );
                        }
                        None
                    }
                    ConsoleCommand::Action { action, target } => Some(BridgeCommand::ExecuteAction {
                        action,
                        selector: Some(host.resolve(&target)),
                    }),
                    ConsoleCommand::Watch { target } => {
                        let group = host.resolve(&target);
                        let feedback_id = uuid::Uuid::new_v4().to_string();
                        println!("Watching {} as [{}]", group, feedback_id);
                        watches.insert(feedback_id.clone(), group.clone());
                        Some(BridgeCommand::SubscribeFeedback {
                            feedback_id,
                            selector: Some(group),
                        })
                    }
                    ConsoleCommand::Unwatch { feedback_id } => {
                        let group = watches.remove(&feedback_id);
                        last_values.remove(&feedback_id);
                        if group.is_none() {
                            println!("Not watching [{}]", feedback_id);
                        }
                        Some(BridgeCommand::UnsubscribeFeedback {
                            feedback_id,
                            selector: group,
                        })
                    }
                    ConsoleCommand::Reload => reload_request(&load_config),
                    ConsoleCommand::Quit => Some(BridgeCommand::Shutdown),
                };

                if let Some(request) = request {
                    let quit = matches!(request, BridgeCommand::Shutdown);
                    if cmd_tx.send(request).await.is_err() || quit {
                        break;
                    }
                }
            }
        }
    }
}

fn print_commands() {
    println!("COMMANDS:");
    println!("    groups                List known groups");
    println!("    play <group>          Play a group (index from 'groups' or rundown|||group id)");
    println!("    stop <group>          Stop a group");
    println!("    pause <group>         Pause a group");
    println!("    watch <group>         Report when a group starts or stops playing");
    println!("    unwatch <id>          Stop a watch");
    println!("    status                Show watched groups");
    println!("    reload                Re-read the config file");
    println!("    quit                  Exit");
}
