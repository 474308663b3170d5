//! Two-level configuration loader.
//!
//! The top-level manifest maps task names to per-task CSV files and
//! carries the signing secret. Task CSV rows describe base objects,
//! object requirements and numbered conditions, seven `:`-separated
//! fields each.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use hashbrown::HashSet;
use tracing::{debug, warn};

use crate::consts::MAX_CONDITIONS;
use crate::error::CheckError;
use crate::geometry::{bounded, parse_coords};
use crate::model::{
    BaseObject, Checker, Condition, ConditionKind, ObjectRequirement, ObjectType, Predicate,
    Selector, Task,
};

/// Manifest key that sets the checker secret.
const SECRET_KEY: &str = "secret";

/// Row discriminators and header prefixes of the task CSV format.
const BASE_ROW: &str = "base";
const REQ_ROW: &str = "req";
const HEADER_PREFIXES: [&str; 2] = ["id", "obj"];

/// Fields per task CSV data row.
const ROW_FIELDS: usize = 7;

impl Checker {
    /// Loads the manifest at `path` and every task file it references.
    ///
    /// Manifest lines lacking a `:` or with an empty value are skipped;
    /// the reserved `secret` key may appear exactly once and must be
    /// present. Task paths are used as written, the way the engine's
    /// grading setup lays them out.
    pub fn from_config(path: impl AsRef<Path>) -> Result<Self, CheckError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CheckError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut secret: Option<String> = None;
        let mut tasks: Vec<Task> = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| CheckError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let Some((key, value)) = line.split_once(':') else {
                if !line.trim().is_empty() {
                    warn!(line = idx + 1, "skipping manifest line without ':'");
                }
                continue;
            };
            if value.is_empty() {
                warn!(line = idx + 1, key, "skipping manifest line with empty value");
                continue;
            }

            if key == SECRET_KEY {
                if secret.is_some() {
                    return Err(CheckError::DuplicateSecret {
                        path: path.to_path_buf(),
                    });
                }
                secret = Some(bounded(value));
            } else {
                if !seen_names.insert(key.to_string()) {
                    return Err(CheckError::DuplicateTask {
                        name: key.to_string(),
                        path: path.to_path_buf(),
                    });
                }
                let task = Task::from_csv(value, key)?;
                debug!(
                    task = %task.name,
                    base_objects = task.base_objects.len(),
                    requirements = task.requirements.len(),
                    conditions = task.conditions.len(),
                    "task loaded"
                );
                for cond in &task.conditions {
                    debug!(task = %task.name, condition = %cond);
                }
                tasks.push(task);
            }
        }

        let secret = secret.ok_or_else(|| CheckError::MissingSecret {
            path: path.to_path_buf(),
        })?;

        Ok(Checker { secret, tasks })
    }
}

impl Task {
    /// Reads one task CSV file.
    pub fn from_csv(path: impl AsRef<Path>, name: &str) -> Result<Self, CheckError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CheckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Task::parse(BufReader::new(file), name, path)
    }

    /// Parses task CSV content.
    ///
    /// Two passes over the buffered lines: the first counts distinct
    /// condition ordinals so the 1..=7 bound is enforced before any row
    /// is interpreted, the second populates the task.
    pub fn parse(
        reader: impl BufRead,
        name: &str,
        path: &Path,
    ) -> Result<Self, CheckError> {
        let lines = reader
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| CheckError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let conditions_count = count_conditions(&lines);
        if conditions_count == 0 {
            return Err(CheckError::NoConditions(name.to_string()));
        }
        if conditions_count > MAX_CONDITIONS {
            return Err(CheckError::TooManyConditions {
                name: name.to_string(),
                count: conditions_count,
                limit: MAX_CONDITIONS,
            });
        }

        let mut task = Task {
            name: bounded(name),
            base_objects: Vec::new(),
            requirements: Vec::new(),
            conditions: Vec::with_capacity(conditions_count),
        };

        for (idx, line) in lines.iter().enumerate() {
            if is_skippable(line) {
                continue;
            }
            let row = Row {
                path,
                line: idx + 1,
                fields: split_row(line, path, idx + 1)?,
            };
            match row.fields[0] {
                BASE_ROW => {
                    let base = parse_base(&row)?;
                    task.base_objects.push(base);
                }
                REQ_ROW => {
                    let req = parse_requirement(&row)?;
                    task.requirements.push(req);
                }
                _ => append_condition(&mut task.conditions, &row)?,
            }
        }

        Ok(task)
    }
}

/// One data row with its provenance, for error reporting.
struct Row<'a> {
    path: &'a Path,
    line: usize,
    fields: Vec<&'a str>,
}

impl Row<'_> {
    fn error(&self, reason: impl Into<String>) -> CheckError {
        CheckError::Config {
            path: self.path.to_path_buf(),
            line: self.line,
            reason: reason.into(),
        }
    }
}

/// Header lines, blank lines and lines starting with whitespace carry no
/// data.
fn is_skippable(line: &str) -> bool {
    line.is_empty()
        || line.starts_with([' ', '\t'])
        || HEADER_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Counts distinct condition ordinals: a row whose leading integer
/// exceeds the previous maximum opens a new condition; repeats are the
/// AND halves and rows with a non-numeric head are left for the second
/// pass to reject.
fn count_conditions(lines: &[String]) -> usize {
    let mut last_n = 0i64;
    let mut count = 0usize;
    for line in lines {
        if is_skippable(line) {
            continue;
        }
        let first = line.split(':').next().unwrap_or("");
        if first == BASE_ROW || first == REQ_ROW {
            continue;
        }
        let n = first.parse::<i64>().unwrap_or(0);
        if n > last_n {
            last_n = n;
            count += 1;
        }
    }
    count
}

/// Splits a data row on `:`. At least seven fields are required; extra
/// trailing fields are tolerated and ignored.
fn split_row<'a>(
    line: &'a str,
    path: &Path,
    line_no: usize,
) -> Result<Vec<&'a str>, CheckError> {
    let fields: Vec<&str> = line.split(':').collect();
    if fields.len() < ROW_FIELDS {
        return Err(CheckError::Config {
            path: path.to_path_buf(),
            line: line_no,
            reason: format!(
                "expected {} ':'-separated fields, found {}",
                ROW_FIELDS,
                fields.len()
            ),
        });
    }
    Ok(fields)
}

/// `base:type:class:x,y-or-empty:hp:dmg:`
fn parse_base(row: &Row<'_>) -> Result<BaseObject, CheckError> {
    let ty = parse_object_type(row, row.fields[1])?;
    let class = bounded(row.fields[2]);
    let pos = if row.fields[3].is_empty() {
        None
    } else {
        Some(
            parse_coords(row.fields[3])
                .map_err(|e| row.error(format!("bad coordinates '{}': {e}", row.fields[3])))?,
        )
    };
    let hp = parse_float(row, row.fields[4])?;
    let damage = parse_float(row, row.fields[5])?;
    Ok(BaseObject {
        ty,
        class,
        pos,
        hp,
        damage,
    })
}

/// `req:type:class:minimum:limit::`
fn parse_requirement(row: &Row<'_>) -> Result<ObjectRequirement, CheckError> {
    let ty = parse_object_type(row, row.fields[1])?;
    let class = bounded(row.fields[2]);
    let minimum = parse_count(row, row.fields[3], "minimum")?;
    let limit = parse_count(row, row.fields[4], "limit")?;
    if limit < minimum {
        return Err(row.error(format!(
            "requirement limit {limit} is below minimum {minimum}"
        )));
    }
    if !row.fields[5].is_empty() || !row.fields[6].is_empty() {
        return Err(row.error("requirement rows end with two empty fields"));
    }
    Ok(ObjectRequirement {
        ty,
        class,
        minimum,
        limit,
    })
}

/// `n:kind:prim_type:prim_class:sec_type:sec_class:arg`
///
/// A row repeating the previous ordinal attaches as its AND branch;
/// otherwise the ordinal must strictly increase.
fn append_condition(conditions: &mut Vec<Condition>, row: &Row<'_>) -> Result<(), CheckError> {
    let n = row.fields[0]
        .parse::<u8>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| row.error(format!("bad condition number '{}'", row.fields[0])))?;

    let predicate = parse_predicate(row)?;

    match conditions.last_mut() {
        Some(last) if last.n == n => {
            if last.second.is_some() {
                return Err(row.error(format!(
                    "condition {n} already has an AND branch"
                )));
            }
            last.second = Some(predicate);
        }
        Some(last) if n < last.n => {
            return Err(row.error(format!(
                "condition number {n} does not increase (previous {})",
                last.n
            )));
        }
        _ => conditions.push(Condition {
            n,
            first: predicate,
            second: None,
        }),
    }
    Ok(())
}

fn parse_predicate(row: &Row<'_>) -> Result<Predicate, CheckError> {
    let kind = ConditionKind::from_str(row.fields[1])
        .map_err(|_| row.error(format!("unknown condition kind '{}'", row.fields[1])))?;
    let primary = parse_selector(row, row.fields[2], row.fields[3])?;
    let secondary = parse_selector(row, row.fields[4], row.fields[5])?;
    let arg = parse_float(row, row.fields[6])?;
    Ok(Predicate {
        kind,
        primary,
        secondary,
        arg,
    })
}

/// An empty type field is allowed for kinds that need no object; the
/// selector then stays at its default and is never consulted.
fn parse_selector(row: &Row<'_>, ty: &str, class: &str) -> Result<Selector, CheckError> {
    let ty = if ty.is_empty() {
        ObjectType::default()
    } else {
        parse_object_type(row, ty)?
    };
    Ok(Selector {
        ty,
        class: bounded(class),
    })
}

fn parse_object_type(row: &Row<'_>, s: &str) -> Result<ObjectType, CheckError> {
    ObjectType::from_str(s).map_err(|_| row.error(format!("unknown object type '{s}'")))
}

/// Floats default to zero when the field is empty; anything non-empty
/// must parse.
fn parse_float(row: &Row<'_>, s: &str) -> Result<f32, CheckError> {
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse::<f32>()
        .map_err(|_| row.error(format!("bad number '{s}'")))
}

fn parse_count(row: &Row<'_>, s: &str, what: &str) -> Result<u8, CheckError> {
    s.parse::<u8>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| row.error(format!("bad {what} number '{s}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse_task(content: &str) -> Result<Task, CheckError> {
        Task::parse(Cursor::new(content), "t", Path::new("t.csv"))
    }

    #[test]
    fn parses_base_req_and_condition_rows() {
        let task = parse_task(
            "id:cond.type:pri obj type:pri obj class:sec obj type:sec obj class:arg\n\
             1:proxy:player::mob:zombie:2.0\n\
             base:mob:zombie:5,5:0:0:\n\
             req:mob:zombie:1:3::\n",
        )
        .unwrap();

        assert_eq!(task.conditions.len(), 1);
        let cond = &task.conditions[0];
        assert_eq!(cond.n, 1);
        assert_eq!(cond.first.kind, ConditionKind::Proximity);
        assert_eq!(cond.first.primary.ty, ObjectType::Player);
        assert_eq!(cond.first.secondary.ty, ObjectType::Mob);
        assert_eq!(cond.first.secondary.class, "zombie");
        assert_eq!(cond.first.arg, 2.0);
        assert!(cond.second.is_none());

        assert_eq!(task.base_objects.len(), 1);
        let base = &task.base_objects[0];
        assert_eq!(base.ty, ObjectType::Mob);
        assert_eq!(base.pos.unwrap().x, 5.0);
        assert_eq!(base.hp, 0.0);

        assert_eq!(task.requirements.len(), 1);
        let req = &task.requirements[0];
        assert_eq!((req.minimum, req.limit), (1, 3));
    }

    #[test]
    fn base_position_may_be_left_open() {
        let task = parse_task("1:move:mob:zombie:::\nbase:mob:zombie::10:1:\n").unwrap();
        let base = &task.base_objects[0];
        assert!(base.pos.is_none());
        assert_eq!(base.hp, 10.0);
        assert_eq!(base.damage, 1.0);
    }

    #[test]
    fn repeated_ordinal_becomes_and_branch() {
        let task = parse_task(
            "1:approach:player::mob:zombie:0\n\
             1:proxy:player::mob:zombie:3\n\
             2:win:::::0\n",
        )
        .unwrap();
        assert_eq!(task.conditions.len(), 2);
        let and = task.conditions[0].second.as_ref().unwrap();
        assert_eq!(and.kind, ConditionKind::Proximity);
        assert_eq!(and.arg, 3.0);
        assert!(task.conditions[1].second.is_none());
    }

    #[test]
    fn third_row_for_same_ordinal_is_rejected() {
        let err = parse_task(
            "1:approach:player::mob:zombie:0\n\
             1:proxy:player::mob:zombie:3\n\
             1:move:mob:zombie:::\n",
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::Config { .. }));
    }

    #[test]
    fn decreasing_ordinal_is_rejected() {
        let err = parse_task(
            "2:win:::::0\n\
             1:move:mob:zombie:::\n",
        )
        .unwrap_err();
        assert!(matches!(err, CheckError::Config { .. }));
    }

    #[test]
    fn zero_conditions_is_rejected() {
        let err = parse_task("base:mob:zombie:5,5:0:0:\n").unwrap_err();
        assert!(matches!(err, CheckError::NoConditions(_)));
    }

    #[test]
    fn eight_conditions_is_rejected() {
        let mut content = String::new();
        for n in 1..=8 {
            content.push_str(&format!("{n}:move:mob:zombie:::\n"));
        }
        let err = parse_task(&content).unwrap_err();
        assert!(matches!(err, CheckError::TooManyConditions { count: 8, .. }));
    }

    #[test]
    fn trailing_extra_fields_are_tolerated() {
        // Rows written with a trailing extra separator still load.
        let task = parse_task("2:destroy:mob:zombie::::\n").unwrap();
        assert_eq!(task.conditions[0].first.kind, ConditionKind::Destroyed);
        assert_eq!(task.conditions[0].first.arg, 0.0);
    }

    #[test]
    fn short_rows_are_rejected() {
        let err = parse_task("1:move:mob:zombie\n").unwrap_err();
        assert!(matches!(err, CheckError::Config { .. }));
    }

    #[test]
    fn unknown_kind_and_type_are_rejected() {
        assert!(parse_task("1:teleport:player::mob:zombie:0\n").is_err());
        assert!(parse_task("1:proxy:wizard::mob:zombie:0\n").is_err());
        assert!(parse_task("base:wizard:zombie:5,5:0:0:\n1:win:::::0\n").is_err());
    }

    #[test]
    fn bad_requirement_bounds_are_rejected() {
        assert!(parse_task("req:mob:zombie:0:3::\n1:win:::::0\n").is_err());
        assert!(parse_task("req:mob:zombie:3:1::\n1:win:::::0\n").is_err());
        assert!(parse_task("req:mob:zombie:1:3:x:\n1:win:::::0\n").is_err());
    }

    #[test]
    fn bad_floats_are_rejected() {
        assert!(parse_task("base:mob:zombie:5,5:ten:0:\n1:win:::::0\n").is_err());
        assert!(parse_task("1:proxy:player::mob:zombie:close\n").is_err());
    }

    #[test]
    fn headers_and_blank_lines_are_skipped() {
        let task = parse_task(
            "id:cond.type:whatever\n\
             obj type:obj class:minimum:limit\n\
             \n\
             \t\n\
             1:win:::::0\n",
        )
        .unwrap();
        assert_eq!(task.conditions.len(), 1);
    }
}
