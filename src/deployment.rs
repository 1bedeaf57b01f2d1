use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use log::{error, info, warn};
use teloxide::{
    dispatching::UpdateHandler, dptree, prelude::*, types::Update as TgUpdate,
    update_listeners::Polling, RequestError,
};
use tokio::task::JoinHandle;

use crate::app::{Application, InitError};
use crate::config::{Config, ConfigError};
use crate::server::{router, AppState};

/// How updates reach the bot. Fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotMode {
    Polling,
    Webhook,
}

impl fmt::Display for BotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotMode::Polling => write!(f, "POLLING (background worker)"),
            BotMode::Webhook => write!(f, "WEBHOOK (push delivery)"),
        }
    }
}

impl FromStr for BotMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "polling" => Ok(BotMode::Polling),
            "webhook" => Ok(BotMode::Webhook),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Uninitialized,
    Initializing,
    Polling,
    /// Webhook mode: initialized, waiting for pushes.
    Passive,
    Stopped,
    Crashed,
}

impl RunnerState {
    pub fn can_transition_to(self, next: RunnerState) -> bool {
        use RunnerState::*;
        matches!(
            (self, next),
            (Uninitialized, Initializing)
                | (Initializing, Polling | Passive | Crashed)
                | (Polling, Stopped | Crashed)
        )
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunnerState::Uninitialized => "uninitialized",
            RunnerState::Initializing => "initializing",
            RunnerState::Polling => "polling",
            RunnerState::Passive => "passive",
            RunnerState::Stopped => "stopped",
            RunnerState::Crashed => "crashed",
        };
        f.write_str(name)
    }
}

/// Tracks the runner's lifecycle state. Not consulted by the health route.
pub struct Supervisor {
    state: Mutex<RunnerState>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RunnerState::Uninitialized),
        }
    }

    pub fn state(&self) -> RunnerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Moves to `next` if allowed. Returns whether the transition happened.
    pub fn transition(&self, next: RunnerState) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let current = *state;
        if !current.can_transition_to(next) {
            warn!("⚠️ Ignoring invalid runner transition {current} -> {next}");
            return false;
        }
        *state = next;
        info!("🔁 Runner state: {current} -> {next}");
        true
    }
}

pub async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let supervisor = Arc::new(Supervisor::new());
    let bot = Bot::new(config.bot_token.clone());
    info!("🚀 Bot deployment mode: {}", config.mode);

    supervisor.transition(RunnerState::Initializing);
    let app = match initialize(&bot, &config).await {
        Ok(app) => app,
        Err(e) => {
            supervisor.transition(RunnerState::Crashed);
            return Err(e.into());
        }
    };

    match config.mode {
        BotMode::Polling => {
            spawn_polling_worker(bot, app.clone(), supervisor.clone());
        }
        BotMode::Webhook => {
            supervisor.transition(RunnerState::Passive);
            info!("📭 Webhook mode - updates arrive only via POST /webhook");
        }
    }

    serve(app, &config).await
}

async fn initialize(bot: &Bot, config: &Config) -> Result<Arc<Application>, InitError> {
    let app = Application::initialize(bot.clone(), config).await?;
    if config.mode == BotMode::Webhook {
        register_webhook(bot, config).await?;
    }
    info!("🤖 Bot @{} initialized", app.bot_username());
    Ok(app)
}

async fn register_webhook(bot: &Bot, config: &Config) -> Result<(), InitError> {
    info!("🔗 Setting up webhook at: {}", config.webhook_url);
    let mut request = bot.set_webhook(config.webhook_url.clone());
    if let Some(secret) = &config.webhook_secret {
        request = request.secret_token(secret.clone());
        info!("🔐 Webhook secret token configured");
    }
    request.await.map_err(InitError::Webhook)?;
    Ok(())
}

/// Spawns the polling loop plus a watcher that records how it ended.
pub fn spawn_polling_worker(
    bot: Bot,
    app: Arc<Application>,
    supervisor: Arc<Supervisor>,
) -> JoinHandle<()> {
    let worker = tokio::spawn(run_polling_mode(bot, app));
    supervisor.transition(RunnerState::Polling);
    info!("🤖 Polling worker started in background");

    tokio::spawn(async move {
        match worker.await {
            Ok(Ok(())) => {
                supervisor.transition(RunnerState::Stopped);
                warn!("🛑 Polling worker stopped");
            }
            Ok(Err(e)) => {
                supervisor.transition(RunnerState::Crashed);
                error!("💥 Polling worker failed to start: {e}");
            }
            Err(e) => {
                supervisor.transition(RunnerState::Crashed);
                error!("💥 Polling worker crashed: {e}");
            }
        }
    })
}

/// Handler tree for polled updates. Handlers log their own failures, so every
/// update ends in `Ok` and the loop moves on to the next one.
pub fn polling_handler() -> UpdateHandler<RequestError> {
    dptree::endpoint(|update: TgUpdate, app: Arc<Application>| async move {
        app.process(update).await;
        respond(())
    })
}

/// Runs the polling loop until the listener ends. Returns `Err` if the
/// dispatcher could not start (its own `get_me` call failed).
pub async fn run_polling_mode(bot: Bot, app: Arc<Application>) -> Result<(), RequestError> {
    info!("👂 Dropping pending updates and starting polling loop");

    // Dropping pending updates also removes any webhook registered earlier.
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, polling_handler())
        .dependencies(dptree::deps![app])
        .build()
        .try_dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("Error from polling listener"),
        )
        .await
}

async fn serve(app: Arc<Application>, config: &Config) -> Result<(), Box<dyn Error>> {
    let state = AppState {
        app,
        webhook_secret: config.webhook_secret.clone(),
    };
    let port = config.port;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| format!("Failed to bind to port {port}: {e}"))?;

    info!("👂 HTTP server listening on 0.0.0.0:{port}");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| format!("Server failed: {e}").into())
}
