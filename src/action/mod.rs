//! Actions and the outcomes they produce

#[allow(clippy::module_inception)]
pub mod action;
pub mod fault;
pub mod result;

pub use action::{Action, ActionFuture, ActionHandler};
pub use fault::{Fault, FaultKind};
pub use result::{ActionResult, ActionResults, SUCCESS_CODE};
