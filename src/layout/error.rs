use thiserror::Error;

use crate::config::ConfigError;
use crate::ir::EdgeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("edge {0} has not been routed")]
    NotRouted(EdgeId),
    #[error("invalid layout config: {0}")]
    Config(#[from] ConfigError),
}
