//! Checker error taxonomy.
//!
//! Every failure folds into one of two kinds: [`ErrorKind::BadParameters`]
//! for missing inputs and semantic violations of the configuration or
//! scene, and [`ErrorKind::FormatError`] for syntactic violations of the
//! log grammar. The numeric codes match the library return codes the
//! command-line front-end exposes as its exit status.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::ObjectType;

/// Coarse classification of a [`CheckError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Unreadable files, semantic violations of the config, scene
    /// validation failures, unknown task ids.
    BadParameters = 1,
    /// Syntactic violations of the log grammar.
    FormatError = 2,
}

/// Errors produced while loading a configuration or checking a log.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Config {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("the checker secret is defined twice in {path}")]
    DuplicateSecret { path: PathBuf },

    #[error("no checker secret defined in {path}")]
    MissingSecret { path: PathBuf },

    #[error("duplicate task '{name}' in {path}")]
    DuplicateTask { name: String, path: PathBuf },

    #[error("task '{0}' defines no conditions")]
    NoConditions(String),

    #[error("task '{name}' defines {count} conditions, the limit is {limit}")]
    TooManyConditions {
        name: String,
        count: usize,
        limit: usize,
    },

    #[error("unknown task '{0}'")]
    UnknownTask(String),

    #[error("scene is missing a required object: type {ty}, class '{class}'")]
    MissingBaseObject { ty: ObjectType, class: String },

    #[error(
        "scene contains {found} objects of type {ty} class '{class}', \
         expected between {minimum} and {limit}"
    )]
    RequirementUnmet {
        ty: ObjectType,
        class: String,
        found: usize,
        minimum: u8,
        limit: u8,
    },

    #[error("{path}:{line}: {reason}")]
    LogFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("unknown object id '{id}' at time {time}")]
    UnknownObject { id: String, time: u32 },
}

impl CheckError {
    /// The coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::Io { .. }
            | CheckError::Config { .. }
            | CheckError::DuplicateSecret { .. }
            | CheckError::MissingSecret { .. }
            | CheckError::DuplicateTask { .. }
            | CheckError::NoConditions(_)
            | CheckError::TooManyConditions { .. }
            | CheckError::UnknownTask(_)
            | CheckError::MissingBaseObject { .. }
            | CheckError::RequirementUnmet { .. } => ErrorKind::BadParameters,
            CheckError::LogFormat { .. } | CheckError::UnknownObject { .. } => {
                ErrorKind::FormatError
            }
        }
    }

    /// Numeric library return code (1 = bad parameters, 2 = format error).
    pub fn code(&self) -> u8 {
        self.kind() as u8
    }
}
