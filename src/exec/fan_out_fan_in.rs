//! Fan-out followed by a single reducing action

use tracing::{debug, instrument};

use super::context::ExecContext;
use super::invoke::settle;
use super::parallel::Parallel;
use super::Pattern;
use crate::action::{Action, ActionResults};
use crate::core::errors::Result;
use crate::core::registry::Registry;

pub const PATTERN_NAME: &str = "fanoutfanin";

/// Runs actions through [`Parallel`], then hands all their outcomes to one reducer.
///
/// The reducer starts only after the whole fan-out completed, and receives
/// error outcomes too. The result holds exactly one entry, keyed by the
/// reducer's name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FanOutFanIn {
    parallel: Parallel,
}

impl FanOutFanIn {
    pub fn new() -> Self {
        Self {
            parallel: Parallel::new(),
        }
    }

    #[instrument(
        skip_all,
        fields(execution_id = %ctx.execution_id(), reducer = %reducer.name())
    )]
    pub async fn apply<T, O, U, I>(
        &self,
        ctx: &ExecContext,
        registry: &Registry,
        actions: I,
        reducer: Action<ActionResults<O>, U>,
    ) -> Result<ActionResults<U>>
    where
        T: Send + 'static,
        O: Send + 'static,
        U: Send + 'static,
        I: IntoIterator<Item = Action<T, O>>,
    {
        let fan_out = self.parallel.apply(ctx, registry, actions).await?;
        debug!(outcomes = fan_out.len(), "fan-out joined, running reducer");

        let scoped = ctx.with_registry(registry.clone());
        let (name, _, producer) = reducer.into_parts();
        let input = scoped.clone();
        let outcome = settle(&scoped, &name, move || producer(input, Some(fan_out))).await;

        Ok(ActionResults::single(name, outcome))
    }
}

impl Pattern for FanOutFanIn {
    fn name(&self) -> &'static str {
        PATTERN_NAME
    }
}
