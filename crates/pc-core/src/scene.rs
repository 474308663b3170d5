//! Scene table rows and scene validation.
//!
//! The log's scene table materializes the runtime object set; once the
//! table closes, the task's base objects and object requirements are
//! checked against it before any event is processed.

use std::path::Path;

use tracing::debug;

use crate::error::CheckError;
use crate::geometry::{bounded, parse_coords};
use crate::model::{BaseObject, ObjectType, RuntimeObject, Task};

/// Fields per scene table row.
const ROW_FIELDS: usize = 7;

/// Parses one scene data row: `id | class | node id | type | (x,y) | hp |
/// damage`, whitespace-trimmed fields, the node id unused.
pub fn parse_scene_row(
    line: &str,
    path: &Path,
    line_no: usize,
) -> Result<RuntimeObject, CheckError> {
    let error = |reason: String| CheckError::LogFormat {
        path: path.to_path_buf(),
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.split('|').map(|f| f.trim_matches([' ', '\t'])).collect();
    if fields.len() != ROW_FIELDS {
        return Err(error(format!(
            "expected {ROW_FIELDS} '|'-separated fields, found {}",
            fields.len()
        )));
    }
    if fields[0].is_empty() {
        return Err(error("empty object id".into()));
    }
    if fields[1].is_empty() {
        return Err(error("empty object class".into()));
    }

    let pos = parse_coords(fields[4])
        .map_err(|e| error(format!("bad coordinates '{}': {e}", fields[4])))?;
    let hp = parse_float(fields[5]).map_err(|s| error(format!("bad hp '{s}'")))?;
    let damage = parse_float(fields[6]).map_err(|s| error(format!("bad damage '{s}'")))?;

    Ok(RuntimeObject {
        ty: ObjectType::from_scene_token(fields[3]),
        class: bounded(fields[1]),
        id: bounded(fields[0]),
        pos,
        prev_pos: pos,
        hp,
        damage,
        pos_predefined: true,
        valid: false,
    })
}

fn parse_float(s: &str) -> Result<f32, String> {
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse::<f32>().map_err(|_| s.to_string())
}

/// Checks the materialized scene against the task's expectations.
///
/// Every base object must claim a distinct, not-yet-claimed runtime
/// object matching its specified attributes; claimed objects are flagged
/// via [`RuntimeObject::valid`]. Every requirement's (type, class) count
/// must fall within its bounds. Objects covered by neither are fine.
pub fn validate_scene(task: &Task, objects: &mut [RuntimeObject]) -> Result<(), CheckError> {
    for base in &task.base_objects {
        match objects
            .iter_mut()
            .find(|o| !o.valid && base_matches(base, o))
        {
            Some(object) => {
                debug!(id = %object.id, ty = %base.ty, class = %base.class, "base object matched");
                object.valid = true;
            }
            None => {
                return Err(CheckError::MissingBaseObject {
                    ty: base.ty,
                    class: base.class.clone(),
                })
            }
        }
    }

    for req in &task.requirements {
        let found = objects
            .iter()
            .filter(|o| o.ty == req.ty && o.class == req.class)
            .count();
        if found < usize::from(req.minimum) || found > usize::from(req.limit) {
            return Err(CheckError::RequirementUnmet {
                ty: req.ty,
                class: req.class.clone(),
                found,
                minimum: req.minimum,
                limit: req.limit,
            });
        }
    }

    Ok(())
}

/// Unspecified base attributes (empty class, open position, zero
/// hp/damage) constrain nothing.
fn base_matches(base: &BaseObject, object: &RuntimeObject) -> bool {
    base.ty == object.ty
        && (base.class.is_empty() || base.class == object.class)
        && base.pos.is_none_or(|p| p.close_to(&object.pos))
        && (base.hp == 0.0 || base.hp == object.hp)
        && (base.damage == 0.0 || base.damage == object.damage)
}
