//! Run many actions concurrently and join on all of them

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, field, info, instrument, warn, Span};

use super::context::ExecContext;
use super::invoke::settle;
use super::Pattern;
use crate::action::{Action, ActionResult, ActionResults};
use crate::core::errors::{FlowError, Result};
use crate::core::registry::Registry;

pub const PATTERN_NAME: &str = "parallel";

/// Fan-out of independent actions with join-all semantics.
///
/// Every action is started on its own task. The returned future completes
/// once every action has produced an outcome; a failing action never cancels
/// its siblings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parallel;

impl Parallel {
    pub fn new() -> Self {
        Self
    }

    /// Run `actions` concurrently and collect their outcomes by name.
    ///
    /// Fails only on a precondition: duplicate names when the context's
    /// configuration rejects them. In that case no action is started.
    #[instrument(
        skip_all,
        fields(execution_id = %ctx.execution_id(), actions = field::Empty)
    )]
    pub async fn apply<T, O, I>(
        &self,
        ctx: &ExecContext,
        registry: &Registry,
        actions: I,
    ) -> Result<ActionResults<O>>
    where
        T: Send + 'static,
        O: Send + 'static,
        I: IntoIterator<Item = Action<T, O>>,
    {
        let actions: Vec<Action<T, O>> = actions.into_iter().collect();
        Span::current().record("actions", actions.len());

        check_names(ctx, &actions)?;

        if actions.is_empty() {
            debug!("no actions to run");
            return Ok(ActionResults::empty());
        }

        let scoped = ctx.with_registry(registry.clone());
        let limit = ctx
            .config()
            .max_concurrent_actions
            .map(|max| Arc::new(Semaphore::new(max)));

        info!(max_in_flight = ?ctx.config().max_concurrent_actions, "starting fan-out");

        let mut running = FuturesUnordered::new();
        for action in actions {
            let (name, data, producer) = action.into_parts();
            let scoped = scoped.clone();
            let limit = limit.clone();
            running.push(async move {
                let _permit = match limit {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let input = scoped.clone();
                let result = settle(&scoped, &name, move || producer(input, data)).await;
                (name, result)
            });
        }

        let mut outcomes: HashMap<String, ActionResult<O>> = HashMap::with_capacity(running.len());
        while let Some((name, result)) = running.next().await {
            if outcomes.contains_key(&name) {
                warn!(action = %name, "duplicate action name, keeping the later outcome");
            }
            outcomes.insert(name, result);
        }

        let results: ActionResults<O> = outcomes.into_iter().collect();
        info!(
            succeeded = results.successes().count(),
            failed = results.errors().count(),
            "fan-out complete"
        );
        Ok(results)
    }
}

impl Pattern for Parallel {
    fn name(&self) -> &'static str {
        PATTERN_NAME
    }
}

fn check_names<T, O>(ctx: &ExecContext, actions: &[Action<T, O>]) -> Result<()>
where
    T: Send + 'static,
    O: Send + 'static,
{
    let mut seen = HashSet::with_capacity(actions.len());
    for action in actions {
        if !seen.insert(action.name()) {
            if ctx.config().reject_duplicate_names {
                return Err(FlowError::duplicate_action(action.name()));
            }
            warn!(action = action.name(), "duplicate action name in fan-out");
        }
    }
    Ok(())
}
