//! Behavioural tests for the bootstrap sequence.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, bootstrap_with};

use super::support::{
    FailingConfigLoader, HealthEvent, RecordingHealthReporter, StepResult, TestConfigLoader,
};

pub struct BootstrapWorld {
    loader: Box<dyn ConfigLoader>,
    reporter: RecordingHealthReporter,
    result: Option<Result<Daemon, BootstrapError>>,
}

impl BootstrapWorld {
    fn new() -> Self {
        Self {
            loader: Box::new(healthy_loader()),
            reporter: RecordingHealthReporter::default(),
            result: None,
        }
    }

    fn daemon(&self) -> Result<&Daemon, String> {
        match &self.result {
            Some(Ok(daemon)) => Ok(daemon),
            Some(Err(error)) => Err(format!("bootstrap failed: {error}")),
            None => Err("bootstrap has not run".to_owned()),
        }
    }

    fn error(&self) -> Result<&BootstrapError, String> {
        match &self.result {
            Some(Err(error)) => Ok(error),
            Some(Ok(_)) => Err("bootstrap unexpectedly succeeded".to_owned()),
            None => Err("bootstrap has not run".to_owned()),
        }
    }
}

fn healthy_loader() -> TestConfigLoader {
    TestConfigLoader::new(
        "irc://127.0.0.1:6667".to_owned(),
        Utf8PathBuf::from("channels"),
        4100,
    )
}

#[fixture]
fn world() -> RefCell<BootstrapWorld> {
    RefCell::new(BootstrapWorld::new())
}

#[given("a configuration with credentials and a plain chat server")]
fn given_healthy_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().loader = Box::new(healthy_loader());
}

#[given("a configuration without credentials")]
fn given_no_credentials(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().loader = Box::new(healthy_loader().without_credentials());
}

#[given("a configuration loader that rejects its arguments")]
fn given_failing_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().loader = Box::new(FailingConfigLoader);
}

#[when("the daemon bootstrap runs")]
fn when_bootstrap_runs(world: &RefCell<BootstrapWorld>) {
    let mut world = world.borrow_mut();
    let result = bootstrap_with(world.loader.as_ref(), &world.reporter);
    world.result = Some(result);
}

#[then("bootstrap resolves the nickname \"{nick}\" and server \"{server}\"")]
fn then_resolved(world: &RefCell<BootstrapWorld>, nick: String, server: String) -> StepResult {
    let world = world.borrow();
    let daemon = world.daemon()?;
    if daemon.credentials().nick() != nick {
        return Err(format!("unexpected nick {}", daemon.credentials().nick()));
    }
    if daemon.server().to_string() != server {
        return Err(format!("unexpected server {}", daemon.server()));
    }
    Ok(())
}

#[then("bootstrap fails mentioning \"{fragment}\"")]
fn then_fails(world: &RefCell<BootstrapWorld>, fragment: String) -> StepResult {
    let world = world.borrow();
    let message = world.error()?.to_string();
    if message.contains(&fragment) {
        Ok(())
    } else {
        Err(format!("error '{message}' does not mention '{fragment}'"))
    }
}

#[then("the health reporter records a successful bootstrap")]
fn then_success_recorded(world: &RefCell<BootstrapWorld>) {
    assert_eq!(
        world.borrow().reporter.events(),
        [HealthEvent::BootstrapStarting, HealthEvent::BootstrapSucceeded]
    );
}

#[then("the health reporter records a failed bootstrap")]
fn then_failure_recorded(world: &RefCell<BootstrapWorld>) {
    let events = world.borrow().reporter.events();
    assert_eq!(events.first(), Some(&HealthEvent::BootstrapStarting));
    assert!(
        matches!(events.last(), Some(HealthEvent::BootstrapFailed(_))),
        "events: {events:?}"
    );
    assert_eq!(events.len(), 2);
}

#[scenario(path = "tests/features/daemon_bootstrap.feature")]
fn daemon_bootstrap(#[from(world)] _: RefCell<BootstrapWorld>) -> Result<(), String> {
    Ok(())
}

#[scenario(path = "tests/features/daemon_bootstrap_credentials.feature")]
fn daemon_bootstrap_credentials(#[from(world)] _: RefCell<BootstrapWorld>) -> Result<(), String> {
    Ok(())
}

#[scenario(path = "tests/features/daemon_bootstrap_configuration.feature")]
fn daemon_bootstrap_configuration(#[from(world)] _: RefCell<BootstrapWorld>) -> Result<(), String> {
    Ok(())
}
