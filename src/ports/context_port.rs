//! Market-context port: resolves a proxy instrument to a directional bias.

use crate::domain::config::ContextProxy;
use crate::domain::context::Bias;
use crate::domain::error::LevelscanError;

pub trait ContextPort {
    /// Errors should be `ContextUnavailable`; callers degrade them to `Unknown`.
    fn resolve(&self, proxy: &ContextProxy) -> Result<Bias, LevelscanError>;
}
