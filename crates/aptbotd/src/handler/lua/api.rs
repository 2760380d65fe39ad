//! Values the daemon hands to Lua scripts.

use std::sync::Arc;
use std::time::Duration;

use mlua::{FromLua, Lua, Table, UserData, UserDataMethods, Value};
use tracing::{Level, debug, error, info, warn};

use crate::handler::CancellationToken;
use crate::protocol::Event;
use crate::session::ChatSession;

const LUA_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lua");

/// `session` argument: `send`, `join`, `part` and `nick` methods.
pub(super) struct LuaSession(Arc<dyn ChatSession>);

impl LuaSession {
    pub(super) fn new(session: Arc<dyn ChatSession>) -> Self {
        Self(session)
    }
}

impl UserData for LuaSession {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method(
            "send",
            |lua, this, (channel, text, reply_to): (String, Value, Option<String>)| {
                let lines = message_lines(lua, text)?;
                let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
                this.0
                    .send_message(&channel, &lines, reply_to.as_deref())
                    .map_err(mlua::Error::external)
            },
        );
        methods.add_method("join", |_, this, channel: String| {
            this.0.join_channel(&channel).map_err(mlua::Error::external)
        });
        methods.add_method("part", |_, this, channel: String| {
            this.0.leave_channel(&channel).map_err(mlua::Error::external)
        });
        methods.add_method("nick", |_, this, ()| Ok(this.0.nick().to_owned()));
    }
}

fn message_lines(lua: &Lua, text: Value) -> mlua::Result<Vec<String>> {
    match text {
        Value::Table(table) => table.sequence_values::<String>().collect(),
        other => Ok(vec![String::from_lua(other, lua)?]),
    }
}

/// `token` argument of `start`.
pub(super) struct LuaToken(CancellationToken);

impl LuaToken {
    pub(super) fn new(token: CancellationToken) -> Self {
        Self(token)
    }
}

impl UserData for LuaToken {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("is_cancelled", |_, this, ()| Ok(this.0.is_cancelled()));
        // Returns true when woken by cancellation.
        methods.add_method("sleep", |_, this, seconds: f64| {
            let timeout = Duration::try_from_secs_f64(seconds)
                .map_err(|error| mlua::Error::runtime(format!("invalid sleep: {error}")))?;
            Ok(this.0.wait_timeout(timeout))
        });
    }
}

/// Builds the `event` table: `tags`, `nick`, `command`, `channel`, `body`.
pub(super) fn event_table(lua: &Lua, event: &Event) -> mlua::Result<Table> {
    let tags = lua.create_table()?;
    for (key, value) in event.tags() {
        tags.set(key.as_str(), value.as_str())?;
    }
    let table = lua.create_table()?;
    table.set("tags", tags)?;
    table.set("nick", event.nick())?;
    table.set("command", event.command().map(<&'static str>::from))?;
    table.set("channel", event.channel())?;
    table.set("body", event.body())?;
    Ok(table)
}

/// Installs the global `log` table, tagging records with `channel`.
pub(super) fn register_log(lua: &Lua, channel: &str) -> mlua::Result<()> {
    let log = lua.create_table()?;
    for (name, level) in [
        ("debug", Level::DEBUG),
        ("info", Level::INFO),
        ("warn", Level::WARN),
        ("error", Level::ERROR),
    ] {
        let channel = channel.to_owned();
        let function = lua.create_function(move |_, message: String| {
            emit(level, &channel, &message);
            Ok(())
        })?;
        log.set(name, function)?;
    }
    lua.globals().set("log", log)
}

fn emit(level: Level, channel: &str, message: &str) {
    match level {
        Level::ERROR => error!(target: LUA_TARGET, channel, "{message}"),
        Level::WARN => warn!(target: LUA_TARGET, channel, "{message}"),
        Level::INFO => info!(target: LUA_TARGET, channel, "{message}"),
        _ => debug!(target: LUA_TARGET, channel, "{message}"),
    }
}
