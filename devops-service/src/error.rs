// Service Errors
// Crate-level error type aggregating the per-concern errors

use crate::config::ConfigError;
use crate::planner::PlanError;
use crate::project::RemoteError;
use crate::startup::StartupError;

use std::io;
use thiserror::Error;

/// Errors surfaced by the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
