//! Bridge engine main loop
//!
//! Owns both poll schedules and the command channel. Every unit of work is
//! spawned, so a slow SuperConductor never stalls a timer or a command.
//! Refreshes may therefore overlap; the mirror ends up matching whichever
//! one finished last.

use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::client::{base_url, RemoteClient};
use crate::config::Config;
use crate::surface::Surface;

use super::{Bridge, BridgeCommand};

/// Drives the structural and subscription schedules of a [`Bridge`]
pub struct BridgeEngine {
    /// Configuration
    config: Config,
    /// Shared bridge state
    bridge: Bridge,
    /// Command receiver
    cmd_rx: mpsc::Receiver<BridgeCommand>,
}

impl BridgeEngine {
    pub fn new(config: Config, bridge: Bridge, cmd_rx: mpsc::Receiver<BridgeCommand>) -> Self {
        Self {
            config,
            bridge,
            cmd_rx,
        }
    }

    /// Run the engine main loop until shutdown
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Bridge engine starting for {}",
            base_url(&self.config.server.host, &self.config.server.port)
        );

        // Commands exist even before the first successful refresh
        self.bridge.host().publish_surface(&Surface::build(&[]));
        self.bridge.refresh_structure().await;

        let shutdown = self.bridge.shutdown_token();
        let (mut rundown_timer, mut group_timer) = self.timers();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Bridge shut down");
                    break;
                }

                // Handle commands
                Some(cmd) = self.cmd_rx.recv() => {
                    match cmd {
                        BridgeCommand::ExecuteAction { action, selector } => {
                            let bridge = self.bridge.clone();
                            tokio::spawn(async move {
                                bridge.execute_action(action, selector.as_deref()).await;
                            });
                        }
                        BridgeCommand::SubscribeFeedback { feedback_id, selector } => {
                            if self.bridge.subscribe_feedback(&feedback_id, selector.as_deref()) {
                                self.spawn_subscription_tick();
                            }
                        }
                        BridgeCommand::UnsubscribeFeedback { feedback_id, selector } => {
                            self.bridge.unsubscribe_feedback(&feedback_id, selector.as_deref());
                            self.spawn_subscription_tick();
                        }
                        BridgeCommand::ConfigUpdated(config) => {
                            if self.apply_config(config) {
                                (rundown_timer, group_timer) = self.timers();
                                self.spawn_refresh();
                            }
                        }
                        BridgeCommand::Shutdown => {
                            info!("Shutdown command received");
                            break;
                        }
                    }
                }

                _ = rundown_timer.tick() => {
                    self.spawn_refresh();
                }

                _ = group_timer.tick() => {
                    self.spawn_subscription_tick();
                }
            }
        }

        self.bridge.shutdown();
        info!("Bridge engine stopped");
        Ok(())
    }

    /// Fresh timers; the first tick fires one full period from now
    fn timers(&self) -> (Interval, Interval) {
        let make = |period: Duration| {
            let mut timer = tokio::time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer
        };
        (
            make(self.config.rundown_poll_interval()),
            make(self.config.group_poll_interval()),
        )
    }

    fn spawn_refresh(&self) {
        let bridge = self.bridge.clone();
        tokio::spawn(async move { bridge.refresh_structure().await });
    }

    fn spawn_subscription_tick(&self) {
        let bridge = self.bridge.clone();
        tokio::spawn(async move { bridge.poll_subscriptions().await });
    }

    /// Swap in a new configuration; returns false if it was rejected
    fn apply_config(&mut self, mut config: Config) -> bool {
        if let Err(e) = config.validate() {
            error!("Rejected configuration update: {}", e);
            return false;
        }

        if config.server != self.config.server {
            info!(
                "SuperConductor moved to {}",
                base_url(&config.server.host, &config.server.port)
            );
            self.bridge
                .set_client(RemoteClient::http(&config.server.host, &config.server.port));
        }

        debug!(
            "Polling rundowns every {:?}, groups every {:?}",
            config.rundown_poll_interval(),
            config.group_poll_interval()
        );
        self.config = config;
        true
    }
}

/// Create the command channel for the engine
pub fn create_bridge_channels() -> (mpsc::Sender<BridgeCommand>, mpsc::Receiver<BridgeCommand>) {
    mpsc::channel(32)
}
