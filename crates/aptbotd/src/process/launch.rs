//! Startup ordering and the supervision loop.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::info;

use aptbot_config::Config;

use crate::bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
use crate::control::{ControlServer, DaemonControl, ServeOutcome};
use crate::dispatch::{Dispatcher, HandlerPool, start_background_tasks};
use crate::handler::LuaHandlerLoader;
use crate::health::{HealthReporter, ShutdownCause, StructuredHealthReporter};
use crate::registry::{ChannelDirectory, FsChannelDirectory, HandlerRegistry};
use crate::session::{ChatSession, NetworkConnector, ReconnectPolicy, Session, SessionError};

use super::shutdown::{ShutdownSignal, SystemShutdownSignal};
use super::{LaunchError, PROCESS_TARGET};

/// Collaborators injected into [`run_daemon_with`].
pub struct LaunchPlan<L, S> {
    loader: L,
    reporter: Arc<dyn HealthReporter>,
    shutdown: S,
}

impl<L, S> LaunchPlan<L, S>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    /// Bundles the collaborators.
    #[must_use]
    pub fn new(loader: L, reporter: Arc<dyn HealthReporter>, shutdown: S) -> Self {
        Self {
            loader,
            reporter,
            shutdown,
        }
    }
}

/// What interrupted the control loop.
enum Interrupt {
    Signal,
    DispatcherStopped,
}

type DispatchHandle = JoinHandle<Result<(), SessionError>>;

/// Runs the daemon with the production collaborators until `KILL`, a
/// termination signal, or a fatal error.
///
/// # Errors
///
/// Returns [`LaunchError`] for every failure that should end the process
/// with a failure status.
pub fn run_daemon() -> Result<(), LaunchError> {
    let shutdown =
        SystemShutdownSignal::install().map_err(|source| LaunchError::Signals { source })?;
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    run_daemon_with(LaunchPlan::new(SystemConfigLoader, reporter, shutdown))
}

/// Runs the daemon with injected collaborators.
///
/// Fatal errors raised after configuration loaded are held for the
/// configured exit grace period before being returned.
///
/// # Errors
///
/// Returns [`LaunchError`] as for [`run_daemon`].
pub fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        mut shutdown,
    } = plan;
    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error.into());
        }
    };

    let result = supervise(&config, reporter.as_ref(), &mut shutdown);
    if let Err(error) = &result {
        reporter.launch_failed(error);
        thread::sleep(config.exit_grace());
    }
    result
}

fn supervise(
    config: &Config,
    reporter: &dyn HealthReporter,
    shutdown: &mut dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(&StaticConfigLoader::new(config.clone()), reporter)?;
    let control = ControlServer::bind(config.control_address(), config.control_poll_interval())?;

    let connector = NetworkConnector::new(daemon.server().clone())?;
    let session = Arc::new(Session::new(
        Box::new(connector),
        daemon.credentials().clone(),
        ReconnectPolicy::from_config(config),
    ));
    session
        .connect()
        .map_err(|source| LaunchError::Session { source })?;
    reporter.session_ready(session.nick());

    let directory = FsChannelDirectory::new(config.channels_dir());
    for channel in directory.channel_names()? {
        session
            .join_channel(&channel)
            .map_err(|source| LaunchError::Session { source })?;
    }
    let registry = Arc::new(HandlerRegistry::new(
        Box::new(directory),
        Box::new(LuaHandlerLoader::new(config.channels_dir())),
    ));
    let report = registry.reload()?;
    reporter.registry_reloaded(&report);
    let chat: Arc<dyn ChatSession> = Arc::clone(&session) as Arc<dyn ChatSession>;
    start_background_tasks(&registry, &chat);

    let dispatcher = spawn_dispatcher(config, &session, &registry)?;
    let control_handler = DaemonControl::new(Arc::clone(&session), Arc::clone(&registry));
    let outcome = control.serve(&control_handler, || {
        if shutdown.poll().is_some() {
            return Some(Interrupt::Signal);
        }
        dispatcher
            .is_finished()
            .then_some(Interrupt::DispatcherStopped)
    });

    let cause = match outcome {
        ServeOutcome::Killed => ShutdownCause::ControlKill,
        ServeOutcome::Interrupted(Interrupt::Signal) => ShutdownCause::Signal,
        ServeOutcome::Interrupted(Interrupt::DispatcherStopped) => {
            ShutdownCause::DispatcherStopped
        }
    };
    reporter.shutdown_started(cause);
    session.disconnect();
    registry.clear();
    let result = match dispatcher.join() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(LaunchError::SessionLost { source }),
        Err(_) => Err(LaunchError::DispatcherPanicked),
    };
    info!(target: PROCESS_TARGET, cause = %cause, "shutdown sequence completed");
    result
}

fn spawn_dispatcher(
    config: &Config,
    session: &Arc<Session>,
    registry: &Arc<HandlerRegistry>,
) -> Result<DispatchHandle, LaunchError> {
    let pool = HandlerPool::new(config.handler_workers()).map_err(|source| LaunchError::Spawn {
        role: "handler worker",
        source,
    })?;
    let dispatcher = Dispatcher::new(Arc::clone(session), Arc::clone(registry), pool);
    thread::Builder::new()
        .name("dispatcher".to_owned())
        .spawn(move || {
            let result = dispatcher.run_forever();
            dispatcher.shutdown();
            result
        })
        .map_err(|source| LaunchError::Spawn {
            role: "dispatcher",
            source,
        })
}
