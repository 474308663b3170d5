//! Log checking: drives scene ingestion, event dispatch, condition
//! evaluation and result signing for one invocation.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CheckError;
use crate::eval::evaluate;
use crate::event::{parse_event_line, EventLine};
use crate::geometry::{parse_coords, Point};
use crate::matrix::SatisfactionMatrix;
use crate::model::{Checker, RuntimeObject, Task};
use crate::scene::{parse_scene_row, validate_scene};
use crate::signature::signature_code;

const PLAYER_START_PREFIX: &str = "Player Start Position";
const SCENE_HEADER: &str = "ID | Name | Object ID | Type | Position | HP | Damage";
const HLINE: &str = "---";

/// The result of a completed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Bits 0..6 map to condition ordinals 1..7; bit 7 is reserved and
    /// always clear. Zero means nothing was satisfied.
    pub result: u8,
    /// 64-char lowercase hex signature over (secret, task, salt, result).
    pub signature: String,
}

/// States of the log reader up to the point the scene is validated.
#[derive(Clone, Copy)]
enum SceneState {
    AwaitPlayerStart,
    AwaitSceneHeader,
    ReadScene { band_closed: bool },
}

impl Checker {
    /// Evaluates the log at `log_path` against the named task and signs
    /// the result byte with `salt`.
    ///
    /// All per-check state (the runtime objects, the satisfaction
    /// matrix) is local to the invocation, so one checker may serve any
    /// number of sequential checks.
    pub fn check_log(
        &self,
        task_name: &str,
        salt: i32,
        log_path: impl AsRef<Path>,
    ) -> Result<CheckOutcome, CheckError> {
        let task = self
            .find_task(task_name)
            .ok_or_else(|| CheckError::UnknownTask(task_name.to_string()))?;

        let path = log_path.as_ref();
        let file = File::open(path).map_err(|source| CheckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut lines = BufReader::new(file).lines().enumerate();

        let result = match ingest_scene(&mut lines, task, path)? {
            // The log ended before the scene table completed: there is
            // nothing to evaluate and nothing was satisfied.
            None => 0,
            Some(mut objects) => run_events(&mut lines, task, &mut objects, path)?,
        };

        Ok(CheckOutcome {
            result,
            signature: signature_code(&self.secret, task_name, salt, result),
        })
    }
}

type NumberedLine = (usize, std::io::Result<String>);

fn read_line(item: NumberedLine, path: &Path) -> Result<(usize, String), CheckError> {
    let (idx, line) = item;
    let line = line.map_err(|source| CheckError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((idx + 1, line))
}

/// Consumes lines through the end of the scene table, returning the
/// validated runtime object set with the player appended last, or `None`
/// when the log ends first.
fn ingest_scene<I: Iterator<Item = NumberedLine>>(
    lines: &mut I,
    task: &Task,
    path: &Path,
) -> Result<Option<Vec<RuntimeObject>>, CheckError> {
    let mut state = SceneState::AwaitPlayerStart;
    let mut player_start = Point::default();
    let mut objects: Vec<RuntimeObject> = Vec::new();

    for item in lines {
        let (line_no, line) = read_line(item, path)?;
        match state {
            SceneState::AwaitPlayerStart => {
                if let Some(rest) = line.strip_prefix(PLAYER_START_PREFIX) {
                    let rest = rest.trim_start();
                    let rest = rest.strip_prefix(':').unwrap_or(rest);
                    player_start = parse_coords(rest).map_err(|e| CheckError::LogFormat {
                        path: path.to_path_buf(),
                        line: line_no,
                        reason: format!("bad player start coordinates: {e}"),
                    })?;
                    state = SceneState::AwaitSceneHeader;
                }
            }
            SceneState::AwaitSceneHeader => {
                if line.starts_with(SCENE_HEADER) {
                    state = SceneState::ReadScene { band_closed: false };
                }
            }
            SceneState::ReadScene { band_closed } => {
                if line.starts_with(HLINE) {
                    if !band_closed && objects.is_empty() {
                        // The delimiter under the column header.
                        state = SceneState::ReadScene { band_closed: true };
                        continue;
                    }
                    objects.push(RuntimeObject::player(player_start));
                    for (i, o) in objects.iter().enumerate() {
                        debug!(
                            index = i,
                            ty = %o.ty,
                            class = %o.class,
                            id = %o.id,
                            pos = %o.pos,
                            hp = %o.hp,
                            dmg = %o.damage,
                            "scene object"
                        );
                    }
                    validate_scene(task, &mut objects)?;
                    return Ok(Some(objects));
                }
                objects.push(parse_scene_row(&line, path, line_no)?);
            }
        }
    }

    Ok(None)
}

/// Runs the event loop until `Session ended` or EOF and folds the matrix.
fn run_events<I: Iterator<Item = NumberedLine>>(
    lines: &mut I,
    task: &Task,
    objects: &mut [RuntimeObject],
    path: &Path,
) -> Result<u8, CheckError> {
    let mut matrix = SatisfactionMatrix::new(task.conditions.len(), objects.len());

    for item in lines {
        let (line_no, line) = read_line(item, path)?;
        match parse_event_line(&line, objects, path, line_no)? {
            EventLine::Skipped | EventLine::Ignored => {}
            EventLine::SessionEnd => break,
            EventLine::Event { time, event } => {
                for (i, cond) in task.conditions.iter().enumerate() {
                    if let Some(satisfier) = evaluate(cond, objects, &event) {
                        debug!(time, condition = %cond, "condition satisfied");
                        matrix.record(i, satisfier);
                    }
                }
            }
        }
    }

    debug!(matrix = %matrix, "final satisfaction matrix");
    Ok(matrix.result_byte())
}
