//! Explicit field bindings between editor columns and entity accessors.

use model::core::value::Value;
use serde_json::Value as JsonValue;
use std::{collections::HashMap, fmt, sync::Arc};

pub type Setter<E> = Arc<dyn Fn(&mut E, Value) + Send + Sync>;
pub type Getter<E> = Arc<dyn Fn(&E) -> JsonValue + Send + Sync>;

/// Declared type of a bound property. Submitted values are coerced to it
/// before the setter runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKind {
    String,
    Integer { nullable: bool },
    Float,
    Boolean,
    Date,
    /// A to-one association; the setter receives a [`Value::Reference`], or
    /// [`Value::Null`] for a hidden column left empty.
    Relation { target: String, nullable: bool },
    /// A to-many association; the setter receives a [`Value::List`] of
    /// references replacing the current members.
    Collection { target: String },
}

impl BindingKind {
    pub fn is_collection(&self) -> bool {
        matches!(self, BindingKind::Collection { .. })
    }
}

pub struct FieldBinding<E> {
    pub kind: BindingKind,
    setter: Option<Setter<E>>,
    getter: Option<Getter<E>>,
}

impl<E> Clone for FieldBinding<E> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            setter: self.setter.clone(),
            getter: self.getter.clone(),
        }
    }
}

impl<E> fmt::Debug for FieldBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("kind", &self.kind)
            .field("settable", &self.setter.is_some())
            .field("readable", &self.getter.is_some())
            .finish()
    }
}

impl<E> FieldBinding<E> {
    pub fn set(&self, entity: &mut E, value: Value) -> bool {
        match &self.setter {
            Some(setter) => {
                setter(entity, value);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, entity: &E) -> Option<JsonValue> {
        self.getter.as_ref().map(|getter| getter(entity))
    }

    pub fn is_settable(&self) -> bool {
        self.setter.is_some()
    }
}

/// Name-to-accessor table of one entity type.
///
/// ```ignore
/// let binding = EntityBinding::<User>::new("User", User::default)
///     .bind("email", BindingKind::String,
///         |u, v| u.email = v.as_string().unwrap_or_default(),
///         |u| json!(u.email));
/// ```
pub struct EntityBinding<E> {
    entity: String,
    factory: Arc<dyn Fn() -> E + Send + Sync>,
    fields: HashMap<String, FieldBinding<E>>,
}

impl<E> EntityBinding<E> {
    pub fn new(entity: &str, factory: impl Fn() -> E + Send + Sync + 'static) -> Self {
        Self {
            entity: entity.to_string(),
            factory: Arc::new(factory),
            fields: HashMap::new(),
        }
    }

    pub fn bind(
        mut self,
        name: &str,
        kind: BindingKind,
        setter: impl Fn(&mut E, Value) + Send + Sync + 'static,
        getter: impl Fn(&E) -> JsonValue + Send + Sync + 'static,
    ) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldBinding {
                kind,
                setter: Some(Arc::new(setter)),
                getter: Some(Arc::new(getter)),
            },
        );
        self
    }

    /// A property that is only ever assigned, e.g. a derived field.
    pub fn bind_setter(
        mut self,
        name: &str,
        kind: BindingKind,
        setter: impl Fn(&mut E, Value) + Send + Sync + 'static,
    ) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldBinding {
                kind,
                setter: Some(Arc::new(setter)),
                getter: None,
            },
        );
        self
    }

    /// A read-only property, projected into responses.
    pub fn bind_getter(
        mut self,
        name: &str,
        getter: impl Fn(&E) -> JsonValue + Send + Sync + 'static,
    ) -> Self {
        self.fields.insert(
            name.to_string(),
            FieldBinding {
                kind: BindingKind::String,
                setter: None,
                getter: Some(Arc::new(getter)),
            },
        );
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn field(&self, name: &str) -> Option<&FieldBinding<E>> {
        self.fields.get(name)
    }

    pub fn instantiate(&self) -> E {
        (self.factory)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct User {
        email: String,
        age: Option<i64>,
    }

    #[test]
    fn test_bindings_set_and_get() {
        let binding = EntityBinding::<User>::new("User", User::default)
            .bind(
                "email",
                BindingKind::String,
                |u, v| u.email = v.as_string().unwrap_or_default(),
                |u| json!(u.email),
            )
            .bind_setter("age", BindingKind::Integer { nullable: true }, |u, v| {
                u.age = v.as_i64()
            });

        let mut user = binding.instantiate();
        assert!(binding.field("email").unwrap().set(&mut user, Value::from("a@b.c")));
        assert!(binding.field("age").unwrap().set(&mut user, Value::Int(40)));
        assert_eq!(user.age, Some(40));
        assert_eq!(binding.field("email").unwrap().get(&user), Some(json!("a@b.c")));
        assert_eq!(binding.field("age").unwrap().get(&user), None);
        assert!(binding.field("name").is_none());
        assert_eq!(binding.entity(), "User");
    }
}
