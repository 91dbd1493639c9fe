//! Maps `alias.field` references to property paths into hydrated rows.

use super::{HydrationMode, alias::AliasTable};
use crate::error::GridError;
use serde_json::Value as JsonValue;

/// Walks the alias table from `field`'s alias back to the root and returns
/// the path of the value in a hydrated row: `a.b.c` for object hydration,
/// `[a][b][c]` for array hydration.
pub fn to_property_path(
    field: &str,
    aliases: &AliasTable,
    mode: HydrationMode,
) -> Result<String, GridError> {
    let mut parts = field.split('.');
    let (Some(origin), Some(target)) = (parts.next(), parts.next()) else {
        return Err(GridError::Configuration(format!(
            "Field name '{field}' must consist at least of an alias and a field separated with a period"
        )));
    };

    let mut path = vec![target];
    let mut current = parent_of(aliases, origin, field)?;
    while let Some(parent) = current {
        if path.len() > aliases.len() {
            return Err(GridError::Configuration(format!(
                "Alias chain of '{field}' does not lead back to the root"
            )));
        }
        let Some((origin, target)) = parent.split_once('.') else {
            return Err(GridError::Configuration(format!(
                "Join '{parent}' must consist of an alias and an association"
            )));
        };
        path.push(target);
        current = parent_of(aliases, origin, field)?;
    }

    path.reverse();
    Ok(join_property_path(&path, mode))
}

fn parent_of<'a>(
    aliases: &'a AliasTable,
    alias: &str,
    field: &str,
) -> Result<Option<&'a str>, GridError> {
    aliases
        .get(alias)
        .map(|entry| entry.parent.as_deref())
        .ok_or_else(|| {
            GridError::Configuration(format!("Unknown alias '{alias}' in field '{field}'"))
        })
}

pub fn join_property_path<S: AsRef<str>>(segments: &[S], mode: HydrationMode) -> String {
    let segments: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
    match mode {
        HydrationMode::Array => format!("[{}]", segments.join("][")),
        HydrationMode::Object => segments.join("."),
    }
}

/// Splits either notation back into its segments.
pub fn split_property_path(path: &str) -> Vec<String> {
    match path
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
    {
        Some(inner) => inner.split("][").map(str::to_string).collect(),
        None => path
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Reads a value from a hydrated row. Missing segments read as null.
pub fn read_property(row: &JsonValue, path: &str) -> JsonValue {
    let mut current = row;
    for segment in split_property_path(path) {
        let next = match current {
            JsonValue::Object(map) => map.get(&segment),
            JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(value) => current = value,
            None => return JsonValue::Null,
        }
    }
    current.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        core::data_type::FieldType,
        metadata::{
            entity::{AssociationMapping, EntityMetadata, FieldMapping},
            registry::MetadataRegistry,
        },
    };
    use query::builder::query::QueryBuilder;
    use serde_json::json;

    fn aliases() -> AliasTable {
        let registry = MetadataRegistry::new()
            .with(
                EntityMetadata::new("Employee", "employee", "id")
                    .with_field(FieldMapping::new("id", FieldType::Integer))
                    .with_field(FieldMapping::new("name", FieldType::String))
                    .with_association(AssociationMapping::many_to_one(
                        "department",
                        "Department",
                        "department_id",
                        "id",
                    )),
            )
            .with(
                EntityMetadata::new("Department", "department", "id")
                    .with_field(FieldMapping::new("id", FieldType::Integer))
                    .with_association(AssociationMapping::many_to_one(
                        "manager", "Employee", "manager_id", "id",
                    )),
            );
        let mut qb = QueryBuilder::new();
        qb.from("Employee", "_employee")
            .left_join("_employee.department", "department")
            .left_join("department.manager", "department_manager");
        AliasTable::from_query(&qb, &registry).unwrap()
    }

    #[test]
    fn test_property_paths_follow_hydration() {
        let aliases = aliases();
        assert_eq!(
            to_property_path("_employee.name", &aliases, HydrationMode::Object).unwrap(),
            "name"
        );
        assert_eq!(
            to_property_path("department_manager.name", &aliases, HydrationMode::Object).unwrap(),
            "department.manager.name"
        );
        assert_eq!(
            to_property_path("department_manager.name", &aliases, HydrationMode::Array).unwrap(),
            "[department][manager][name]"
        );
    }

    #[test]
    fn test_round_trip_between_notations() {
        let aliases = aliases();
        let dotted = to_property_path("department_manager.name", &aliases, HydrationMode::Object).unwrap();
        let bracketed = to_property_path("department_manager.name", &aliases, HydrationMode::Array).unwrap();
        assert_eq!(split_property_path(&dotted), split_property_path(&bracketed));
        assert_eq!(
            join_property_path(&split_property_path(&bracketed), HydrationMode::Object),
            dotted
        );
    }

    #[test]
    fn test_invalid_fields() {
        let aliases = aliases();
        assert!(matches!(
            to_property_path("name", &aliases, HydrationMode::Object),
            Err(GridError::Configuration(_))
        ));
        assert!(matches!(
            to_property_path("office.name", &aliases, HydrationMode::Object),
            Err(GridError::Configuration(_))
        ));
    }

    #[test]
    fn test_read_property() {
        let row = json!({"id": 1, "department": {"manager": {"name": "Ada"}}, "tags": [{"id": 4}]});
        assert_eq!(read_property(&row, "department.manager.name"), json!("Ada"));
        assert_eq!(read_property(&row, "[department][manager][name]"), json!("Ada"));
        assert_eq!(read_property(&row, "tags.0.id"), json!(4));
        assert_eq!(read_property(&row, "department.budget"), json!(null));
    }
}
