//! Tokenizer for `[@tags ]:prefix COMMAND [#channel|*] [:trailing]`.

use std::collections::HashMap;

use super::escape::{collapse_whitespace, decode_tag_value};
use super::event::{Command, Event};
use super::PING_PROBE;

/// Tag holding the body of the message being replied to. Its value is
/// unescaped and whitespace-collapsed during parsing.
pub const REPLY_BODY_TAG: &str = "reply-parent-msg-body";

/// Parses one raw line. Returns `None` for empty lines, the keep-alive probe,
/// lines that do not match the grammar, and unrecognised commands.
#[must_use]
pub fn parse(raw_line: &str) -> Option<Event> {
    let line = raw_line.trim_end_matches(['\r', '\n']);
    if line.is_empty() || line == PING_PROBE {
        return None;
    }

    let (tags, rest) = split_tags(line)?;
    let (prefix, rest) = rest.strip_prefix(':')?.split_once(' ')?;
    let (middle, trailing) = match rest.split_once(" :") {
        Some((middle, trailing)) => (middle, Some(trailing)),
        None => (rest, None),
    };

    let mut params = middle.split_whitespace();
    let command = params.next()?.parse::<Command>().ok()?;
    let channel = params
        .next()
        .and_then(|token| token.strip_prefix('#'))
        .unwrap_or_default();

    let event = Event::new(command, channel)
        .with_tags(tags)
        .with_nick(sender_nick(prefix))
        .with_body(trailing.map(collapse_whitespace).unwrap_or_default());
    Some(event)
}

fn split_tags(line: &str) -> Option<(HashMap<String, String>, &str)> {
    match line.strip_prefix('@') {
        Some(tagged) => {
            let (raw_tags, rest) = tagged.split_once(' ')?;
            Some((parse_tags(raw_tags), rest.trim_start()))
        }
        None => Some((HashMap::new(), line)),
    }
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
            let value = if key == REPLY_BODY_TAG {
                collapse_whitespace(&decode_tag_value(value))
            } else {
                value.to_owned()
            };
            (key.to_owned(), value)
        })
        .collect()
}

fn sender_nick(prefix: &str) -> &str {
    prefix.split_once('!').map_or("", |(nick, _)| nick)
}
