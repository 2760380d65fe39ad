//! Behavioural tests for hot-reloading channel handlers from disk.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use crate::dispatch::start_background_tasks;
use crate::handler::test_support::RecordingSession;
use crate::handler::{HANDLER_FILE, LuaHandlerLoader};
use crate::registry::{BackgroundTask, FsChannelDirectory, HandlerRegistry, ReloadReport};
use crate::session::ChatSession;

use super::support::{StepResult, wait_until};

const TICKER: &str = r#"
function main(session, event)
end

function start(session, event, token)
    while not token:is_cancelled() do
        session:send(event.channel, "tick")
        if token:sleep(0.01) then
            break
        end
    end
end
"#;

pub struct ReloadWorld {
    _dir: TempDir,
    root: Utf8PathBuf,
    session: Arc<RecordingSession>,
    registry: HandlerRegistry,
    originals: HashMap<String, Arc<BackgroundTask>>,
    last_report: Option<ReloadReport>,
}

impl ReloadWorld {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
        let registry = HandlerRegistry::new(
            Box::new(FsChannelDirectory::new(root.clone())),
            Box::new(LuaHandlerLoader::new(root.clone())),
        );
        Self {
            _dir: dir,
            root,
            session: RecordingSession::new(),
            registry,
            originals: HashMap::new(),
            last_report: None,
        }
    }

    fn reload(&mut self) -> StepResult {
        let report = self
            .registry
            .reload()
            .map_err(|error| format!("reload failed: {error}"))?;
        let chat: Arc<dyn ChatSession> = Arc::clone(&self.session) as Arc<dyn ChatSession>;
        start_background_tasks(&self.registry, &chat);
        self.last_report = Some(report);
        Ok(())
    }

    fn background(&self, channel: &str) -> Result<Arc<BackgroundTask>, String> {
        self.registry
            .registration(channel)
            .map(|registration| registration.background())
            .ok_or_else(|| format!("{channel} is not registered"))
    }

    fn ticks_for(&self, channel: &str) -> usize {
        self.session
            .sent()
            .iter()
            .filter(|line| line.channel == channel && line.text == "tick")
            .count()
    }
}

impl Drop for ReloadWorld {
    fn drop(&mut self) {
        self.registry.clear();
    }
}

#[fixture]
fn world() -> RefCell<ReloadWorld> {
    RefCell::new(ReloadWorld::new())
}

#[given("a channel \"{channel}\" whose handler ticks in the background")]
fn given_ticking_channel(world: &RefCell<ReloadWorld>, channel: String) -> StepResult {
    let world = world.borrow();
    let dir = world.root.join(&channel);
    fs::create_dir_all(&dir).map_err(|error| error.to_string())?;
    fs::write(dir.join(HANDLER_FILE), TICKER).map_err(|error| error.to_string())
}

#[when("the handlers are loaded")]
fn when_loaded(world: &RefCell<ReloadWorld>) -> StepResult {
    let mut world = world.borrow_mut();
    world.reload()?;
    for channel in world.registry.channels() {
        let task = world.background(&channel)?;
        world.originals.insert(channel, task);
    }
    Ok(())
}

#[when("the handlers are reloaded")]
fn when_reloaded(world: &RefCell<ReloadWorld>) -> StepResult {
    world.borrow_mut().reload()
}

#[when("the directory for \"{channel}\" is deleted")]
fn when_directory_deleted(world: &RefCell<ReloadWorld>, channel: String) -> StepResult {
    let world = world.borrow();
    fs::remove_dir_all(world.root.join(&channel)).map_err(|error| error.to_string())
}

#[then("the background task for \"{channel}\" is ticking")]
fn then_ticking(world: &RefCell<ReloadWorld>, channel: String) -> StepResult {
    let world = world.borrow();
    if wait_until(|| world.ticks_for(&channel) > 0) {
        Ok(())
    } else {
        Err(format!("no background output for {channel}"))
    }
}

#[then("the background task for \"{channel}\" is still the original one")]
fn then_original_task(world: &RefCell<ReloadWorld>, channel: String) -> StepResult {
    let world = world.borrow();
    let original = world
        .originals
        .get(&channel)
        .ok_or_else(|| format!("no original task for {channel}"))?;
    let current = world.background(&channel)?;
    if !Arc::ptr_eq(original, &current) {
        return Err(format!("{channel} received a new background task"));
    }
    if current.token().is_cancelled() {
        return Err(format!("{channel} background task was cancelled"));
    }
    Ok(())
}

#[then("the background task for \"{channel}\" is cancelled")]
fn then_cancelled(world: &RefCell<ReloadWorld>, channel: String) -> StepResult {
    let world = world.borrow();
    let original = world
        .originals
        .get(&channel)
        .ok_or_else(|| format!("no original task for {channel}"))?;
    if !original.token().is_cancelled() {
        return Err(format!("{channel} background task is still running"));
    }
    if world.registry.lookup(&channel).is_some() {
        return Err(format!("{channel} is still registered"));
    }
    let dropped = world
        .last_report
        .as_ref()
        .is_some_and(|report| report.dropped.contains(&channel));
    if dropped {
        Ok(())
    } else {
        Err(format!("{channel} missing from the dropped list"))
    }
}

#[scenario(path = "tests/features/handler_reload.feature")]
fn handler_reload(#[from(world)] _: RefCell<ReloadWorld>) -> Result<(), String> {
    Ok(())
}
