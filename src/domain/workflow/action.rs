//! Programmatic workflow steps

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::Variables;
use crate::domain::DomainError;

/// An executable program backing an ACTION step.
///
/// Any error returned is treated by the executor as a failure of the whole run.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ActionProgram: Send + Sync {
    /// Name used in logs and lifecycle events
    fn name(&self) -> String;

    /// Run the program against the step's resolved inputs
    async fn execute(&self, input: Variables) -> Result<Variables, DomainError>;
}
