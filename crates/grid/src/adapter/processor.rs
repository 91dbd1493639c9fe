use crate::{column::Column, error::GridError, state::GridState};
use model::metadata::MetadataProvider;
use query::builder::query::QueryBuilder;

/// What a processor may look at while shaping the query.
pub struct ProcessContext<'a> {
    pub metadata: &'a dyn MetadataProvider,
    pub columns: &'a [Column],
    pub state: &'a GridState,
}

/// One step of building the entity query: query processors produce the base
/// query, criteria processors narrow it down.
pub trait QueryProcessor: Send + Sync {
    fn process(&mut self, qb: &mut QueryBuilder, ctx: &ProcessContext<'_>) -> Result<(), GridError>;
}

pub struct FnProcessor<F>(F);

impl<F> QueryProcessor for FnProcessor<F>
where
    F: FnMut(&mut QueryBuilder, &ProcessContext<'_>) -> Result<(), GridError> + Send + Sync,
{
    fn process(&mut self, qb: &mut QueryBuilder, ctx: &ProcessContext<'_>) -> Result<(), GridError> {
        (self.0)(qb, ctx)
    }
}

/// Wraps a closure as a processor.
pub fn processor_fn<F>(f: F) -> Box<dyn QueryProcessor>
where
    F: FnMut(&mut QueryBuilder, &ProcessContext<'_>) -> Result<(), GridError>
        + Send
        + Sync
        + 'static,
{
    Box::new(FnProcessor(f))
}
