//! Stage handler trait and implementations.
//!
//! Handlers hold a stage's business logic. The driver opens the stage's
//! execution window, calls the handler registered under the stage name, and
//! closes the window again.

mod definition;
mod registry;
mod result;

pub use definition::StageDefinition;
pub use registry::StageRegistry;
pub use result::StageResult;

use crate::context::RunContext;
use crate::core::StageOutcome;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for stage handlers.
///
/// Expected failures should be registered through [`RunContext::register`];
/// an `Err` (or a panic) is treated as a handler fault and aborts the run.
#[async_trait]
pub trait StageHandler: Send + Sync + Debug {
    /// Returns the stage name this handler serves.
    fn name(&self) -> &str;

    /// Executes the stage.
    ///
    /// # Errors
    ///
    /// Returns an error for faults the handler cannot express as incidents.
    async fn execute(&self, ctx: &mut RunContext) -> anyhow::Result<StageOutcome>;
}

/// A simple function-based handler.
pub struct FnStage<F>
where
    F: Fn(&mut RunContext) -> anyhow::Result<StageOutcome> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&mut RunContext) -> anyhow::Result<StageOutcome> + Send + Sync,
{
    /// Creates a new function-based handler.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&mut RunContext) -> anyhow::Result<StageOutcome> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> StageHandler for FnStage<F>
where
    F: Fn(&mut RunContext) -> anyhow::Result<StageOutcome> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut RunContext) -> anyhow::Result<StageOutcome> {
        (self.func)(ctx)
    }
}

/// A pass-through handler.
///
/// Copies the input manifest's data into the output manifest when the stage
/// has both, and succeeds.
#[derive(Debug, Clone)]
pub struct NoOpStage {
    name: String,
}

impl NoOpStage {
    /// Creates a new pass-through handler.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl StageHandler for NoOpStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut RunContext) -> anyhow::Result<StageOutcome> {
        let input = ctx.manifest_in().map(|m| m.data.clone());
        if let (Some(data), Some(out)) = (input, ctx.manifest_out_mut()) {
            out.data.extend(data);
        }
        Ok(StageOutcome::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incidents::IncidentCatalog;
    use crate::manifest::Manifest;
    use crate::testing::TestPipeline;
    use std::sync::Arc;

    fn test_context() -> (RunContext, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = TestPipeline::standard(dir.path()).build();
        let ctx = RunContext::new(Arc::new(config), Arc::new(IncidentCatalog::builtin()));
        (ctx, dir)
    }

    #[tokio::test]
    async fn test_fn_stage() {
        let stage = FnStage::new("Discover", |ctx: &mut RunContext| {
            ctx.add_summary("found 3 files");
            Ok(StageOutcome::ok_with_data(serde_json::json!({"files": 3})))
        });
        assert_eq!(stage.name(), "Discover");

        let (mut ctx, _dir) = test_context();
        let outcome = stage.execute(&mut ctx).await.unwrap();
        assert!(outcome.success);
        assert_eq!(ctx.summary(), ["found 3 files".to_string()]);
    }

    #[tokio::test]
    async fn test_fn_stage_error() {
        let stage = FnStage::new("Discover", |_ctx: &mut RunContext| {
            Err(anyhow::anyhow!("share unreachable"))
        });

        let (mut ctx, _dir) = test_context();
        let err = stage.execute(&mut ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "share unreachable");
    }

    #[tokio::test]
    async fn test_noop_stage_passes_data_through() {
        let stage = NoOpStage::new("Validate");
        let (mut ctx, _dir) = test_context();
        let mut input = Manifest::new("Discover");
        input.set_data("files", 3);
        ctx.manifest_in = Some(input);
        ctx.manifest_out = Some(Manifest::new("Validate"));

        let outcome = stage.execute(&mut ctx).await.unwrap();

        assert!(outcome.success);
        assert_eq!(ctx.manifest_out_mut().unwrap().data["files"], 3);
    }
}
