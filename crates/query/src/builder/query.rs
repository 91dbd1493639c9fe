//! Entity-level query builder. Works with entity names, aliases and dotted
//! association paths; `lower` turns it into a SQL `Select`.

use crate::{
    ast::common::{JoinKind, OrderDir},
    builder::predicate::Predicate,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromEntity {
    pub entity: String,
    pub alias: String,
}

/// A join along an association: `path` is `parentAlias.association`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityJoin {
    pub kind: JoinKind,
    pub path: String,
    pub alias: String,
}

impl EntityJoin {
    /// Splits `path` into `(parentAlias, association)`.
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.path.split_once('.')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Only the listed fields of the aliased entity.
    Partial { alias: String, fields: Vec<String> },
    /// Every mapped field of the aliased entity.
    Entity(String),
    /// `COUNT([DISTINCT] alias.field)`.
    Count { field: String, distinct: bool },
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    from: Vec<FromEntity>,
    selects: Vec<Selection>,
    joins: Vec<EntityJoin>,
    predicate: Option<Predicate>,
    group_by: Vec<String>,
    order_by: Vec<(String, OrderDir)>,
    first_result: Option<u64>,
    max_results: Option<u64>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(&mut self, entity: &str, alias: &str) -> &mut Self {
        self.from.push(FromEntity {
            entity: entity.to_string(),
            alias: alias.to_string(),
        });
        self
    }

    /// Replaces the selection list.
    pub fn select(&mut self, selection: Selection) -> &mut Self {
        self.selects = vec![selection];
        self
    }

    pub fn add_select(&mut self, selection: Selection) -> &mut Self {
        self.selects.push(selection);
        self
    }

    pub fn left_join(&mut self, path: &str, alias: &str) -> &mut Self {
        self.joins.push(EntityJoin {
            kind: JoinKind::Left,
            path: path.to_string(),
            alias: alias.to_string(),
        });
        self
    }

    pub fn inner_join(&mut self, path: &str, alias: &str) -> &mut Self {
        self.joins.push(EntityJoin {
            kind: JoinKind::Inner,
            path: path.to_string(),
            alias: alias.to_string(),
        });
        self
    }

    pub fn and_where(&mut self, predicate: Predicate) -> &mut Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn add_group_by(&mut self, field: &str) -> &mut Self {
        self.group_by.push(field.to_string());
        self
    }

    pub fn add_order_by(&mut self, field: &str, direction: OrderDir) -> &mut Self {
        self.order_by.push((field.to_string(), direction));
        self
    }

    pub fn reset_order_by(&mut self) -> &mut Self {
        self.order_by.clear();
        self
    }

    pub fn reset_group_by(&mut self) -> &mut Self {
        self.group_by.clear();
        self
    }

    pub fn set_first_result(&mut self, offset: u64) -> &mut Self {
        self.first_result = Some(offset);
        self
    }

    pub fn set_max_results(&mut self, limit: u64) -> &mut Self {
        self.max_results = Some(limit);
        self
    }

    pub fn from_entities(&self) -> &[FromEntity] {
        &self.from
    }

    pub fn root(&self) -> Option<&FromEntity> {
        self.from.first()
    }

    pub fn selects(&self) -> &[Selection] {
        &self.selects
    }

    pub fn joins(&self) -> &[EntityJoin] {
        &self.joins
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn order_by(&self) -> &[(String, OrderDir)] {
        &self.order_by
    }

    pub fn first_result(&self) -> Option<u64> {
        self.first_result
    }

    pub fn max_results(&self) -> Option<u64> {
        self.max_results
    }

    /// A copy suitable for counting `identifier` (an `alias.field`): no
    /// ordering or paging, and `COUNT(DISTINCT ..)` when the query is grouped
    /// by that identifier.
    pub fn count_query(&self, identifier: &str) -> QueryBuilder {
        let mut qb = self.clone();
        qb.reset_order_by();
        qb.first_result = None;
        qb.max_results = None;

        let distinct = qb.group_by.iter().any(|g| g == identifier);
        if distinct {
            qb.reset_group_by();
        }
        qb.select(Selection::Count {
            field: identifier.to_string(),
            distinct,
        });
        qb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> QueryBuilder {
        let mut qb = QueryBuilder::new();
        qb.from("Book", "_book")
            .add_select(Selection::Partial {
                alias: "_book".into(),
                fields: vec!["id".into(), "title".into()],
            })
            .left_join("_book.author", "author")
            .add_order_by("_book.title", OrderDir::Desc)
            .set_first_result(20)
            .set_max_results(10);
        qb
    }

    #[test]
    fn test_count_query_strips_paging_and_ordering() {
        let count = base().count_query("_book.id");
        assert!(count.order_by().is_empty());
        assert_eq!(count.first_result(), None);
        assert_eq!(count.max_results(), None);
        assert_eq!(count.joins().len(), 1);
        assert_eq!(
            count.selects(),
            &[Selection::Count {
                field: "_book.id".into(),
                distinct: false
            }]
        );
    }

    #[test]
    fn test_count_query_distinct_when_grouped_by_identifier() {
        let mut qb = base();
        qb.add_group_by("_book.id");
        let count = qb.count_query("_book.id");
        assert!(count.group_by().is_empty());
        assert!(matches!(
            count.selects()[0],
            Selection::Count { distinct: true, .. }
        ));
    }

    #[test]
    fn test_and_where_accumulates() {
        let mut qb = base();
        qb.and_where(Predicate::contains("_book.title", "a"));
        qb.and_where(Predicate::contains("author.name", "b"));
        assert_eq!(qb.predicate().unwrap().comparisons().len(), 2);
    }

    #[test]
    fn test_join_parts() {
        let qb = base();
        assert_eq!(qb.joins()[0].parts(), Some(("_book", "author")));
    }
}
