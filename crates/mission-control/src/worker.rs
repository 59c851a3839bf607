//! Background work. Every task reports back through the event channel and
//! never touches dashboard state directly.

use crate::actions::{self, LaunchMode};
use crate::gateway::{GatewayClient, GatewayError};
use crate::state::Effect;
use mc_core::probe::run_probe;
use mc_core::{discover, Config, FieldGroup, Project, StatusProbes, StatusUpdate};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

pub const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug)]
pub enum AppEvent {
    /// Discovery finished for reload request `request`.
    ProjectsLoaded { request: u64, projects: Vec<Project> },
    /// One probe finished for registry generation `generation`.
    Probe {
        generation: u64,
        name: String,
        update: Option<StatusUpdate>,
    },
    ChatReply(Result<String, String>),
    Gateway(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeJob {
    pub name: String,
    pub path: PathBuf,
    pub group: FieldGroup,
}

/// Executes the side effects the dashboard asks for.
pub struct Dispatcher {
    config: Arc<Config>,
    tx: mpsc::Sender<AppEvent>,
    probes: Arc<dyn StatusProbes>,
    probe_limit: Arc<Semaphore>,
    gateway: Option<Arc<GatewayClient>>,
    rediscover: bool,
}

impl Dispatcher {
    pub fn new(
        config: Arc<Config>,
        tx: mpsc::Sender<AppEvent>,
        probes: Arc<dyn StatusProbes>,
        gateway: Option<Arc<GatewayClient>>,
        rediscover: bool,
    ) -> Self {
        let probe_limit = Arc::new(Semaphore::new(config.probe_concurrency.max(1)));
        Self {
            config,
            tx,
            probes,
            probe_limit,
            gateway,
            rediscover,
        }
    }

    pub fn ping_gateway(&self) {
        if let Some(client) = &self.gateway {
            spawn_ping(client.clone(), self.tx.clone());
        }
    }

    /// Handles every effect except `Quit` and foreground launches, which
    /// need the terminal and stay with the event loop.
    pub fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Reload { request } => {
                // --rediscover applies to the first load only.
                let rediscover = std::mem::take(&mut self.rediscover);
                spawn_discovery(self.config.clone(), request, rediscover, self.tx.clone());
            }
            Effect::Probe { generation, jobs } => {
                debug!(generation, count = jobs.len(), "scheduling probes");
                for job in jobs {
                    spawn_probe(
                        self.probes.clone(),
                        self.probe_limit.clone(),
                        generation,
                        job,
                        self.tx.clone(),
                    );
                }
            }
            Effect::SendChat { message, cwd } => {
                spawn_chat(self.gateway.clone(), message, cwd, self.tx.clone());
            }
            Effect::Launch { action, project, spec } => match spec.mode {
                LaunchMode::Background => {
                    info!(?action, %project, "dispatching action");
                    actions::launch_background(&spec);
                }
                LaunchMode::Foreground => {
                    warn!(?action, %project, "foreground launch reached the dispatcher; ignoring");
                }
            },
            Effect::Quit => {}
        }
    }
}

pub fn spawn_discovery(
    config: Arc<Config>,
    request: u64,
    rediscover: bool,
    tx: mpsc::Sender<AppEvent>,
) {
    tokio::spawn(async move {
        let loaded =
            tokio::task::spawn_blocking(move || discover::load_projects(&config, rediscover)).await;
        let projects = match loaded {
            Ok(Ok(projects)) => {
                info!(count = projects.len(), request, "discovery finished");
                projects
            }
            Ok(Err(err)) => {
                warn!(%err, "discovery failed; showing empty portfolio");
                Vec::new()
            }
            Err(err) => {
                warn!(?err, "discovery task panicked; showing empty portfolio");
                Vec::new()
            }
        };
        let _ = tx.send(AppEvent::ProjectsLoaded { request, projects }).await;
    });
}

fn spawn_probe(
    probes: Arc<dyn StatusProbes>,
    limit: Arc<Semaphore>,
    generation: u64,
    job: ProbeJob,
    tx: mpsc::Sender<AppEvent>,
) {
    tokio::spawn(async move {
        let Ok(_permit) = limit.acquire_owned().await else {
            return;
        };
        let ProbeJob { name, path, group } = job;
        let update = run_probe(probes.as_ref(), group, &path).await;
        if update.is_none() {
            debug!(%name, ?group, "probe produced no result");
        }
        let _ = tx
            .send(AppEvent::Probe {
                generation,
                name,
                update,
            })
            .await;
    });
}

fn spawn_chat(
    client: Option<Arc<GatewayClient>>,
    message: String,
    cwd: PathBuf,
    tx: mpsc::Sender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = match client {
            Some(client) => client.send_message(&message, &cwd).await,
            None => Err(GatewayError::NotConfigured),
        };
        let reply = result.map_err(|err| {
            warn!(%err, "chat send failed");
            err.to_string()
        });
        let _ = tx.send(AppEvent::ChatReply(reply)).await;
    });
}

fn spawn_ping(client: Arc<GatewayClient>, tx: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let connected = match client.ping().await {
            Ok(()) => {
                info!(url = client.base_url(), "gateway reachable");
                true
            }
            Err(err) => {
                debug!(%err, "gateway ping failed");
                false
            }
        };
        let _ = tx.send(AppEvent::Gateway(connected)).await;
    });
}
