//! Deferred, provider-translatable queries.
//!
//! A [`Query`] is a source plus an ordered list of `select` stages. Stages are [`Lambda`] trees, never closures, so
//! a provider can inspect and translate the whole pipeline before running it.

use std::fmt;
use std::sync::Arc;

use crate::error::EvalError;
use crate::expr::Lambda;
use crate::value::Value;

/// Executes (and optionally translates) a query pipeline.
pub trait QueryProvider: fmt::Debug + Send + Sync {
    /// Run every stage over every source value, in order.
    fn execute(&self, source: &[Value], stages: &[Lambda]) -> Result<Vec<Value>, EvalError>;

    /// Textual translation of the pipeline. The default renders each stage as `.select(lambda)`.
    fn translate(&self, stages: &[Lambda]) -> String {
        let mut out = String::from("source");
        for stage in stages {
            out.push_str(&format!(".select({stage})"));
        }
        out
    }
}

/// Evaluates stages in process with the tree-walking evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryProvider;

impl QueryProvider for InMemoryProvider {
    fn execute(&self, source: &[Value], stages: &[Lambda]) -> Result<Vec<Value>, EvalError> {
        tracing::debug!(rows = source.len(), stages = stages.len(), "executing in-memory query");
        source
            .iter()
            .map(|row| stages.iter().try_fold(row.clone(), |value, stage| stage.apply(value)))
            .collect()
    }
}

/// A lazily evaluated sequence described entirely by expression trees.
#[derive(Debug, Clone)]
pub struct Query {
    provider: Arc<dyn QueryProvider>,
    source: Arc<[Value]>,
    stages: Vec<Lambda>,
}

impl Query {
    pub fn new(provider: Arc<dyn QueryProvider>, source: impl Into<Arc<[Value]>>) -> Self {
        Self {
            provider,
            source: source.into(),
            stages: Vec::new(),
        }
    }

    /// Query over in-memory values with [`InMemoryProvider`].
    pub fn in_memory(source: impl IntoIterator<Item = Value>) -> Self {
        let source: Vec<Value> = source.into_iter().collect();
        Self::new(Arc::new(InMemoryProvider), source)
    }

    /// Append a projection stage. Nothing runs until [`Query::to_list`].
    pub fn select(mut self, stage: Lambda) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stages(&self) -> &[Lambda] {
        &self.stages
    }

    /// Execute the pipeline through the provider.
    pub fn to_list(&self) -> Result<Vec<Value>, EvalError> {
        self.provider.execute(&self.source, &self.stages)
    }

    /// The provider's translation of the pipeline.
    pub fn translation(&self) -> String {
        self.provider.translate(&self.stages)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.translation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, Expr};

    fn double() -> Lambda {
        Lambda::new("n", Expr::binary(BinaryOp::Mul, Expr::param("n"), Expr::constant(2)))
    }

    #[test]
    fn test_select_is_deferred_and_ordered() {
        let q = Query::in_memory([Value::Int(1), Value::Int(2)]).select(double()).select(double());
        assert_eq!(q.stages().len(), 2);
        assert_eq!(q.to_list().unwrap(), vec![Value::Int(4), Value::Int(8)]);
        // Running twice gives the same result: the source is not consumed.
        assert_eq!(q.to_list().unwrap(), vec![Value::Int(4), Value::Int(8)]);
    }

    #[test]
    fn test_translation() {
        let q = Query::in_memory([]).select(double());
        insta::assert_snapshot!(q.to_string(), @"source.select(n => (n * 2))");
    }

    #[derive(Debug)]
    struct CountingProvider;

    impl QueryProvider for CountingProvider {
        fn execute(&self, source: &[Value], stages: &[Lambda]) -> Result<Vec<Value>, EvalError> {
            Ok(vec![Value::Int((source.len() * stages.len()) as i64)])
        }

        fn translate(&self, stages: &[Lambda]) -> String {
            format!("{} stage(s)", stages.len())
        }
    }

    #[test]
    fn test_custom_provider_sees_trees() {
        let q = Query::new(Arc::new(CountingProvider), vec![Value::Null; 3]).select(double());
        assert_eq!(q.to_list().unwrap(), vec![Value::Int(3)]);
        assert_eq!(q.translation(), "1 stage(s)");
    }
}
