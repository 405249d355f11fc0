//! Named units of work and the ways to build them
//!
//! Every construction shape collapses into one boxed producer that receives
//! the execution context and the optional input, and returns a future of the
//! action's outcome. The engine only ever sees that producer.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{self, BoxFuture};
use futures::FutureExt;

use super::result::ActionResult;
use crate::exec::context::ExecContext;
use crate::exec::invoke::settle;

/// Future returned by an action producer
pub type ActionFuture<O> = BoxFuture<'static, anyhow::Result<ActionResult<O>>>;

pub(crate) type Producer<T, O> =
    Arc<dyn Fn(ExecContext, Option<T>) -> ActionFuture<O> + Send + Sync>;

/// Trait-object form of an action body
#[async_trait]
pub trait ActionHandler<T, O>: Send + Sync
where
    T: Send + 'static,
    O: Send + 'static,
{
    async fn handle(&self, ctx: ExecContext, input: Option<T>) -> anyhow::Result<ActionResult<O>>;
}

/// A named asynchronous unit of work with optional input data.
///
/// `T` is the input type and `O` the type of the result's data. The name
/// keys the outcome in the `ActionResults` of the pattern that runs it.
pub struct Action<T, O> {
    name: String,
    data: Option<T>,
    producer: Producer<T, O>,
}

impl<T, O> Action<T, O>
where
    T: Send + 'static,
    O: Send + 'static,
{
    /// An action whose body only needs the execution context
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ExecContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ActionResult<O>>> + Send + 'static,
    {
        Self {
            name: name.into(),
            data: None,
            producer: Arc::new(move |ctx: ExecContext, _input: Option<T>| f(ctx).boxed()),
        }
    }

    /// Same as [`Action::new`], with data attached for callers to inspect
    pub fn with_data<F, Fut>(name: impl Into<String>, data: T, f: F) -> Self
    where
        F: Fn(ExecContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ActionResult<O>>> + Send + 'static,
    {
        Self::new(name, f).bind(data)
    }

    /// An action whose body receives its input explicitly.
    ///
    /// Invoked without any input, it yields an error result.
    pub fn with_input<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ExecContext, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<ActionResult<O>>> + Send + 'static,
    {
        let name = name.into();
        let label = name.clone();
        Self {
            name,
            data: None,
            producer: Arc::new(move |ctx: ExecContext, input: Option<T>| match input {
                Some(input) => f(ctx, input).boxed(),
                None => future::ready(Err(anyhow::anyhow!(
                    "action '{}' requires an input but none was bound",
                    label
                )))
                .boxed(),
            }),
        }
    }

    /// An action whose body is blocking or CPU-bound.
    ///
    /// The body runs on the context's bounded blocking pool.
    pub fn blocking<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<T>) -> anyhow::Result<ActionResult<O>> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self {
            name: name.into(),
            data: None,
            producer: Arc::new(move |ctx: ExecContext, input: Option<T>| {
                let f = f.clone();
                async move { ctx.blocking(move || f(input)).await.and_then(|r| r) }
                    .boxed()
            }),
        }
    }

    /// An action backed by a shared handler
    pub fn from_handler(name: impl Into<String>, handler: Arc<dyn ActionHandler<T, O>>) -> Self {
        Self {
            name: name.into(),
            data: None,
            producer: Arc::new(move |ctx: ExecContext, input: Option<T>| {
                let handler = handler.clone();
                async move { handler.handle(ctx, input).await }.boxed()
            }),
        }
    }

    /// Attach input data, replacing any previous data
    pub fn bind(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Invoke with an explicit input instead of the bound data
    pub async fn invoke_with(&self, ctx: &ExecContext, input: T) -> ActionResult<O> {
        let producer = self.producer.clone();
        let scoped = ctx.clone();
        settle(ctx, &self.name, move || producer(scoped, Some(input))).await
    }

    pub(crate) fn into_parts(self) -> (String, Option<T>, Producer<T, O>) {
        (self.name, self.data, self.producer)
    }
}

impl<T, O> Action<T, O>
where
    T: Clone + Send + 'static,
    O: Send + 'static,
{
    /// Invoke once with the bound data. Never fails: faults become error results.
    pub async fn invoke(&self, ctx: &ExecContext) -> ActionResult<O> {
        let producer = self.producer.clone();
        let data = self.data.clone();
        let scoped = ctx.clone();
        settle(ctx, &self.name, move || producer(scoped, data)).await
    }
}

impl<T: Clone, O> Clone for Action<T, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            data: self.data.clone(),
            producer: self.producer.clone(),
        }
    }
}

impl<T: fmt::Debug, O> fmt::Debug for Action<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::FaultKind;
    use crate::core::config::ExecConfig;
    use pretty_assertions::assert_eq;

    fn context() -> ExecContext {
        ExecContext::new(ExecConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn with_data_keeps_data() {
        let action: Action<String, u32> =
            Action::with_data("lookup", "user-7".to_string(), |_| async {
                Ok(ActionResult::success_with_data(7))
            });
        assert_eq!(action.name(), "lookup");
        assert_eq!(action.data().map(String::as_str), Some("user-7"));
        assert_eq!(action.invoke(&context()).await.data(), Some(&7));
    }

    #[tokio::test]
    async fn with_input_uses_bound_data() {
        let action = Action::with_input("double", |_, n: u32| async move {
            Ok(ActionResult::success_with_data(n * 2))
        })
        .bind(21);
        assert_eq!(action.invoke(&context()).await.data(), Some(&42));
    }

    #[tokio::test]
    async fn explicit_input_overrides_bound_data() {
        let action = Action::with_input("double", |_, n: u32| async move {
            Ok(ActionResult::success_with_data(n * 2))
        })
        .bind(1);
        assert_eq!(action.invoke_with(&context(), 5).await.data(), Some(&10));
    }

    #[tokio::test]
    async fn missing_input_is_an_error_result() {
        let action: Action<u32, u32> = Action::with_input("double", |_, n: u32| async move {
            Ok(ActionResult::success_with_data(n * 2))
        });
        let result = action.invoke(&context()).await;
        assert!(result.is_error());
        assert_eq!(result.fault().map(|f| f.kind()), Some(FaultKind::Error));
        assert_eq!(
            result.message(),
            Some("action 'double' requires an input but none was bound")
        );
    }

    #[tokio::test]
    async fn blocking_body_runs_off_the_runtime() {
        let action = Action::blocking("sum", |input: Option<Vec<u64>>| {
            let total = input.unwrap_or_default().iter().sum::<u64>();
            Ok(ActionResult::success_with_data(total))
        })
        .bind(vec![1, 2, 3]);
        assert_eq!(action.invoke(&context()).await.data(), Some(&6));
    }

    #[tokio::test]
    async fn blocking_panic_is_captured() {
        let action: Action<(), ()> = Action::blocking("crash", |_| panic!("blocking body failed"));
        let result = action.invoke(&context()).await;
        assert_eq!(result.fault().map(|f| f.kind()), Some(FaultKind::Panic));
        assert_eq!(result.message(), Some("blocking body failed"));
    }

    struct Greeter;

    #[async_trait]
    impl ActionHandler<String, String> for Greeter {
        async fn handle(
            &self,
            ctx: ExecContext,
            input: Option<String>,
        ) -> anyhow::Result<ActionResult<String>> {
            let who = input.ok_or_else(|| anyhow::anyhow!("nobody to greet"))?;
            let greeting = match ctx.registry().get_named::<String>("greeting") {
                Some(greeting) => format!("{} {}", greeting, who),
                None => format!("hello {}", who),
            };
            Ok(ActionResult::success_with_data(greeting))
        }
    }

    #[tokio::test]
    async fn handler_backed_action() {
        let action: Action<String, String> =
            Action::from_handler("greet", Arc::new(Greeter)).bind("ada".to_string());
        let result = action.invoke(&context()).await;
        assert_eq!(result.data().map(String::as_str), Some("hello ada"));

        let unbound: Action<String, String> = Action::from_handler("greet", Arc::new(Greeter));
        let result = unbound.invoke(&context()).await;
        assert_eq!(result.code(), "error: nobody to greet");
    }

    #[test]
    fn debug_shows_name_and_data() {
        let action: Action<u8, ()> = Action::new("noop", |_| async { Ok(ActionResult::success()) });
        let rendered = format!("{:?}", action.bind(3));
        assert!(rendered.contains("noop"));
        assert!(rendered.contains("3"));
    }
}
