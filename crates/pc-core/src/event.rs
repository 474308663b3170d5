//! Event stream parsing.
//!
//! Every event line carries a `[t]` timestamp; the tail is dispatched on
//! its leading token. Position updates are applied to the runtime
//! objects here, before condition evaluation sees the event.

use std::path::Path;

use crate::error::CheckError;
use crate::geometry::parse_coords;
use crate::model::{ObjectType, RuntimeObject};

/// Log token identifying the player in event payloads.
const PLAYER_TOKEN: &str = "Player";
const POSITION_KEYWORD: &str = "position:";
const ATTACK_PREFIX: &str = "attack ";
const ATTACKED_PREFIX: &str = "attacked ";
const DIED_TOKEN: &str = "died";
const GAME_OVER_PREFIX: &str = "Game Over: ";
const GAME_WON_VALUE: &str = "Win";
const SESSION_ENDED: &str = "Session ended";

/// An event extracted from the log, with object references resolved to
/// runtime indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Position updates were applied; conditions see only world state.
    Tick,
    Attack {
        attacker: usize,
        target: usize,
        damage: f32,
    },
    Attacked {
        target: usize,
        damage: f32,
    },
    Died {
        victim: usize,
    },
    Won,
}

/// What one log line amounted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventLine {
    /// Not a `[t]`-stamped line; skipped.
    Skipped,
    /// A recognized event to run the conditions against.
    Event { time: u32, event: Event },
    /// Recognized but inert (a lost game-over).
    Ignored,
    /// The session end marker; the event loop halts.
    SessionEnd,
}

/// Parses one line of the event section, applying position updates to
/// `objects` as a side effect.
pub fn parse_event_line(
    line: &str,
    objects: &mut [RuntimeObject],
    path: &Path,
    line_no: usize,
) -> Result<EventLine, CheckError> {
    if !line.starts_with('[') {
        return Ok(EventLine::Skipped);
    }

    let error = |reason: String| CheckError::LogFormat {
        path: path.to_path_buf(),
        line: line_no,
        reason,
    };

    let close = line
        .find(']')
        .ok_or_else(|| error("no closing ']' in the time section".into()))?;
    let time = line[1..close]
        .trim()
        .parse::<u32>()
        .map_err(|_| error(format!("bad timestamp '{}'", &line[1..close])))?;
    let tail = line[close + 1..].trim_start_matches([' ', '\t']);

    let event = if tail.contains(POSITION_KEYWORD) {
        apply_positions(tail, time, objects, &error)?;
        Event::Tick
    } else if let Some(rest) = tail.strip_prefix(ATTACK_PREFIX) {
        parse_attack(rest, time, objects, &error)?
    } else if let Some(rest) = tail.strip_prefix(ATTACKED_PREFIX) {
        parse_attacked(rest, time, objects, &error)?
    } else if tail.contains(DIED_TOKEN) {
        parse_died(tail, time, objects, &error)?
    } else if let Some(value) = tail.strip_prefix(GAME_OVER_PREFIX) {
        if value != GAME_WON_VALUE {
            return Ok(EventLine::Ignored);
        }
        Event::Won
    } else if tail.starts_with(SESSION_ENDED) {
        return Ok(EventLine::SessionEnd);
    } else {
        return Err(error(format!("unrecognized event '{tail}'")));
    };

    Ok(EventLine::Event { time, event })
}

/// Resolves an id token: the literal `Player` token names the synthesized
/// player, anything else is matched against scene object ids.
fn resolve(objects: &[RuntimeObject], token: &str) -> Option<usize> {
    if token == PLAYER_TOKEN {
        objects.iter().position(|o| o.ty == ObjectType::Player)
    } else {
        objects
            .iter()
            .position(|o| o.ty != ObjectType::Player && o.id == token)
    }
}

/// `;`-separated entries of `ID position: (x,y)`; the player entry omits
/// the `position:` keyword.
fn apply_positions(
    tail: &str,
    time: u32,
    objects: &mut [RuntimeObject],
    error: &impl Fn(String) -> CheckError,
) -> Result<(), CheckError> {
    for segment in tail.split(';') {
        let segment = segment.trim_matches([' ', '\t']);
        if segment.is_empty() {
            continue;
        }
        let (id, rest) = segment
            .split_once(' ')
            .ok_or_else(|| error(format!("bad position entry '{segment}'")))?;
        let index = resolve(objects, id).ok_or_else(|| CheckError::UnknownObject {
            id: id.to_string(),
            time,
        })?;
        let rest = rest.trim_start();
        let coords = rest.strip_prefix(POSITION_KEYWORD).unwrap_or(rest);
        let pos = parse_coords(coords)
            .map_err(|e| error(format!("bad coordinates '{coords}': {e}")))?;
        objects[index].move_to(pos);
    }
    Ok(())
}

/// `attack <attacker> <_> <dmg> <_> <target id>`; the damage is the third
/// field, the target id is everything after the fourth.
fn parse_attack(
    rest: &str,
    time: u32,
    objects: &[RuntimeObject],
    error: &impl Fn(String) -> CheckError,
) -> Result<Event, CheckError> {
    let fields: Vec<&str> = rest.splitn(5, ' ').collect();
    if fields.len() < 5 {
        return Err(error(format!("bad attack entry '{rest}'")));
    }
    let attacker = resolve(objects, fields[0]).ok_or_else(|| CheckError::UnknownObject {
        id: fields[0].to_string(),
        time,
    })?;
    let damage = fields[2]
        .parse::<f32>()
        .map_err(|_| error(format!("bad attack damage '{}'", fields[2])))?;
    let target_id = fields[4];
    let target = resolve(objects, target_id).ok_or_else(|| CheckError::UnknownObject {
        id: target_id.to_string(),
        time,
    })?;
    Ok(Event::Attack {
        attacker,
        target,
        damage,
    })
}

/// `attacked <target>, ... <dmg>, ...`; commas trail the fields before
/// the damage, which sits fourth.
fn parse_attacked(
    rest: &str,
    time: u32,
    objects: &[RuntimeObject],
    error: &impl Fn(String) -> CheckError,
) -> Result<Event, CheckError> {
    let fields: Vec<&str> = rest.split(' ').collect();
    if fields.len() < 4 {
        return Err(error(format!("bad attacked entry '{rest}'")));
    }
    let target_id = fields[0].strip_suffix(',').unwrap_or(fields[0]);
    let target = resolve(objects, target_id).ok_or_else(|| CheckError::UnknownObject {
        id: target_id.to_string(),
        time,
    })?;
    let damage_field = fields[3].strip_suffix(',').unwrap_or(fields[3]);
    let damage = damage_field
        .parse::<f32>()
        .map_err(|_| error(format!("bad attacked damage '{damage_field}'")))?;
    Ok(Event::Attacked { target, damage })
}

/// `<victim id> died ...`
fn parse_died(
    tail: &str,
    time: u32,
    objects: &[RuntimeObject],
    error: &impl Fn(String) -> CheckError,
) -> Result<Event, CheckError> {
    let (victim_id, _) = tail
        .split_once(' ')
        .ok_or_else(|| error(format!("bad died entry '{tail}'")))?;
    let victim = resolve(objects, victim_id).ok_or_else(|| CheckError::UnknownObject {
        id: victim_id.to_string(),
        time,
    })?;
    Ok(Event::Died { victim })
}
