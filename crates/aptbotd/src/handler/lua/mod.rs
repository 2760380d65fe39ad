//! Handlers written as Lua scripts.
//!
//! Each channel directory holds a `main.lua` defining `main(session, event)`
//! and, optionally, `start(session, event, token)`. `main` runs on the
//! script's primary interpreter state. `start` runs on a fresh state
//! evaluated from the same source so a long-running loop never blocks event
//! delivery.

mod api;

use std::fs;
use std::io;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use mlua::{Function, Lua};
use tracing::debug;

use super::{CancellationToken, ChannelHandler, HandlerError, HandlerLoader, LoadError};
use crate::protocol::Event;
use crate::session::ChatSession;

use api::{LuaSession, LuaToken, event_table, register_log};

/// Name of the script loaded from each channel directory.
pub const HANDLER_FILE: &str = "main.lua";

const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handler");
const MAIN_ENTRY: &str = "main";
const START_ENTRY: &str = "start";

/// Loads `<root>/<channel>/main.lua` for each channel.
#[derive(Debug, Clone)]
pub struct LuaHandlerLoader {
    root: Utf8PathBuf,
}

impl LuaHandlerLoader {
    /// Builds a loader reading scripts below `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Location of the script for `channel`.
    #[must_use]
    pub fn script_path(&self, channel: &str) -> Utf8PathBuf {
        self.root.join(channel).join(HANDLER_FILE)
    }
}

impl HandlerLoader for LuaHandlerLoader {
    fn load(&self, channel: &str) -> Result<Arc<dyn ChannelHandler>, LoadError> {
        let handler = LuaChannelHandler::load(channel, self.script_path(channel))?;
        Ok(Arc::new(handler))
    }
}

struct LuaChannelHandler {
    channel: String,
    path: Utf8PathBuf,
    source: String,
    lua: Lua,
}

impl LuaChannelHandler {
    fn load(channel: &str, path: Utf8PathBuf) -> Result<Self, LoadError> {
        let source = fs::read_to_string(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::Missing { path: path.clone() },
            _ => LoadError::Read {
                path: path.clone(),
                source,
            },
        })?;
        let lua = evaluate(channel, &path, &source)?;
        let main = lua
            .globals()
            .get::<Option<Function>>(MAIN_ENTRY)
            .map_err(|error| script_load_error(&path, &error))?;
        if main.is_none() {
            return Err(LoadError::MissingEntryPoint {
                path,
                name: MAIN_ENTRY,
            });
        }
        debug!(target: HANDLER_TARGET, channel, path = %path, "handler loaded");
        Ok(Self {
            channel: channel.to_owned(),
            path,
            source,
            lua,
        })
    }

    fn failure(&self, entry_point: &'static str, error: &mlua::Error) -> HandlerError {
        HandlerError::Script {
            channel: self.channel.clone(),
            entry_point,
            message: error.to_string(),
        }
    }
}

impl ChannelHandler for LuaChannelHandler {
    fn on_event(&self, session: Arc<dyn ChatSession>, event: &Event) -> Result<(), HandlerError> {
        let call = || -> mlua::Result<()> {
            let main: Function = self.lua.globals().get(MAIN_ENTRY)?;
            let session = self.lua.create_userdata(LuaSession::new(session))?;
            let event = event_table(&self.lua, event)?;
            main.call::<()>((session, event))
        };
        call().map_err(|error| self.failure(MAIN_ENTRY, &error))
    }

    fn run_background(
        &self,
        session: Arc<dyn ChatSession>,
        event: &Event,
        token: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let lua = evaluate(&self.channel, &self.path, &self.source).map_err(|error| {
            HandlerError::Script {
                channel: self.channel.clone(),
                entry_point: START_ENTRY,
                message: error.to_string(),
            }
        })?;
        let call = || -> mlua::Result<()> {
            let Some(start) = lua.globals().get::<Option<Function>>(START_ENTRY)? else {
                debug!(
                    target: HANDLER_TARGET,
                    channel = %self.channel,
                    "handler defines no background task"
                );
                return Ok(());
            };
            let session = lua.create_userdata(LuaSession::new(session))?;
            let event = event_table(&lua, event)?;
            let token = lua.create_userdata(LuaToken::new(token.clone()))?;
            start.call::<()>((session, event, token))
        };
        call().map_err(|error| self.failure(START_ENTRY, &error))
    }
}

fn evaluate(channel: &str, path: &Utf8Path, source: &str) -> Result<Lua, LoadError> {
    let lua = Lua::new();
    register_log(&lua, channel).map_err(|error| script_load_error(path, &error))?;
    lua.load(source)
        .set_name(format!("@{path}"))
        .exec()
        .map_err(|error| script_load_error(path, &error))?;
    Ok(lua)
}

fn script_load_error(path: &Utf8Path, error: &mlua::Error) -> LoadError {
    LoadError::Script {
        path: path.to_owned(),
        message: error.to_string(),
    }
}
