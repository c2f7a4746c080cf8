//! The interpreter facade.
//!
//! An [`Interpreter`] owns the pieces planning needs — static dispatcher,
//! type registry, container, mode flags — and turns expression trees into
//! [`Program`]s. A program is immutable and can be evaluated any number of
//! times against per-call activations, including concurrently.

use std::sync::Arc;

use cel_ir::{CheckedExpr, Expr};
use cel_value::{Registry, Value};

use crate::activation::Activation;
use crate::container::Container;
use crate::dispatcher::{DispatchError, Dispatcher, Overload};
use crate::exec::{EvalCtx, EvalNode};
use crate::late;
use crate::planner::{PlanError, Planner};
use crate::state::EvalState;
use crate::stdlib;

/// Plans expressions against a fixed dispatcher, registry, and container.
pub struct Interpreter {
    dispatcher: Arc<Dispatcher>,
    registry: Arc<Registry>,
    container: Container,
    exhaustive: bool,
    late_binding: bool,
}

impl Interpreter {
    /// Interpreter with the standard overloads and defaults.
    pub fn standard() -> Self {
        match Interpreter::builder().build() {
            Ok(interpreter) => interpreter,
            // The default build registers only the standard catalog, whose
            // ids are unique.
            Err(e) => unreachable!("default interpreter build failed: {e}"),
        }
    }

    /// Start configuring an interpreter.
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::default()
    }

    /// The type registry, for object and enum registration.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The static dispatcher programs will be planned against.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Plan an unchecked expression.
    pub fn plan(&self, expr: &Expr) -> Result<Program, PlanError> {
        self.plan_internal(expr, None)
    }

    /// Plan a checked expression, trusting its annotations.
    pub fn plan_checked(&self, checked: &CheckedExpr) -> Result<Program, PlanError> {
        let Some(expr) = &checked.expr else {
            return Err(PlanError::MissingExpression);
        };
        self.plan_internal(expr, Some(checked))
    }

    fn plan_internal(
        &self,
        expr: &Expr,
        checked: Option<&CheckedExpr>,
    ) -> Result<Program, PlanError> {
        let planner = Planner::new(
            &self.dispatcher,
            self.registry.as_ref(),
            &self.container,
            checked,
            self.exhaustive,
        );
        let mut root = planner.plan(expr)?;
        if self.late_binding {
            root = late::decorate(&root);
        }
        Ok(Program {
            root,
            dispatcher: self.dispatcher.clone(),
            registry: self.registry.clone(),
        })
    }
}

/// Configuration for an [`Interpreter`].
pub struct InterpreterBuilder {
    dispatcher: Dispatcher,
    extra_overloads: Vec<Overload>,
    registry: Option<Arc<Registry>>,
    container: Container,
    exhaustive: bool,
    late_binding: bool,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        InterpreterBuilder {
            dispatcher: stdlib::standard_dispatcher(),
            extra_overloads: Vec::new(),
            registry: None,
            container: Container::root(),
            exhaustive: false,
            late_binding: false,
        }
    }
}

impl InterpreterBuilder {
    /// Replace the dispatcher entirely (drops the standard catalog).
    #[must_use]
    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Register additional overloads on top of the current dispatcher.
    #[must_use]
    pub fn add_overloads(mut self, overloads: impl IntoIterator<Item = Overload>) -> Self {
        self.extra_overloads.extend(overloads);
        self
    }

    /// Share a type registry (defaults to a fresh one).
    #[must_use]
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the namespace container for name resolution.
    #[must_use]
    pub fn container(mut self, name: impl Into<String>) -> Self {
        self.container = Container::new(name);
        self
    }

    /// Disable short-circuiting so every subexpression evaluates and is
    /// recorded in the eval state.
    #[must_use]
    pub fn exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    /// Wrap planned call nodes with late-binding proxies.
    #[must_use]
    pub fn late_binding(mut self, late_binding: bool) -> Self {
        self.late_binding = late_binding;
        self
    }

    /// Build the interpreter; fails if extra overloads collide.
    pub fn build(mut self) -> Result<Interpreter, DispatchError> {
        self.dispatcher.add(self.extra_overloads)?;
        Ok(Interpreter {
            dispatcher: Arc::new(self.dispatcher),
            registry: self.registry.unwrap_or_default(),
            container: self.container,
            exhaustive: self.exhaustive,
            late_binding: self.late_binding,
        })
    }
}

/// A planned, reusable evaluation graph.
pub struct Program {
    root: Arc<EvalNode>,
    dispatcher: Arc<Dispatcher>,
    registry: Arc<Registry>,
}

impl Program {
    /// Evaluate against an activation.
    pub fn eval(&self, activation: &dyn Activation) -> Value {
        self.eval_internal(activation, None)
    }

    /// Evaluate, recording every node's value into `state`.
    pub fn eval_with_state(&self, activation: &dyn Activation, state: &EvalState) -> Value {
        self.eval_internal(activation, Some(state))
    }

    fn eval_internal(&self, activation: &dyn Activation, state: Option<&EvalState>) -> Value {
        let ctx = EvalCtx {
            activation,
            dispatcher: &self.dispatcher,
            provider: self.registry.as_ref(),
            state,
        };
        self.root.eval(&ctx)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests {
    use super::*;
    use cel_ir::Constant;

    fn assert_send_sync<T: Send + Sync>(_: &T) {}

    #[test]
    fn planned_programs_are_shareable_across_threads() {
        let interpreter = Interpreter::standard();
        let expr = Expr::literal(1, Constant::Int(1));
        let program = interpreter.plan(&expr).unwrap();
        assert_send_sync(&program);

        let shared = std::sync::Arc::new(program);
        let worker = {
            let shared = shared.clone();
            std::thread::spawn(move || shared.eval(&crate::activation::EmptyActivation))
        };
        assert_eq!(
            shared.eval(&crate::activation::EmptyActivation),
            Value::Int(1)
        );
        assert_eq!(worker.join().unwrap(), Value::Int(1));
    }
}
