use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Flat field map of an object variable. Fields hold scalars only.
pub type Object = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Scalar(Value),
    Object(Object),
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Binding::Scalar(value) => write!(f, "{}", value),
            Binding::Object(object) => {
                write!(f, "{{")?;
                for (i, (key, value)) in object.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value.to_literal())?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// What an identifier-shaped word refers to.
#[derive(Debug, PartialEq)]
pub enum Resolved<'a> {
    Value(&'a Value),
    Object(&'a Object),
    Unresolved,
}

/// The single variable namespace shared by every statement of a run.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.values.get(name)
    }

    pub fn get_field(&self, name: &str, field: &str) -> Option<&Value> {
        match self.values.get(name) {
            Some(Binding::Object(object)) => object.get(field),
            _ => None,
        }
    }

    pub fn assign(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), Binding::Scalar(value));
    }

    pub fn assign_object(&mut self, name: &str, object: Object) {
        self.values.insert(name.to_string(), Binding::Object(object));
    }

    /// Writes one field, turning the variable into an object first when it
    /// does not hold one. Other fields are left untouched.
    pub fn assign_field(&mut self, name: &str, field: &str, value: Value) {
        let binding = self
            .values
            .entry(name.to_string())
            .or_insert_with(|| Binding::Object(Object::new()));
        if !matches!(binding, Binding::Object(_)) {
            *binding = Binding::Object(Object::new());
        }
        if let Binding::Object(object) = binding {
            object.insert(field.to_string(), value);
        }
    }

    /// Resolves `name.field` against object fields and `name` against
    /// variables. Anything else, or a miss, is `Unresolved`.
    pub fn resolve(&self, word: &str) -> Resolved<'_> {
        if let Some((name, field)) = split_field_ref(word) {
            return match self.get_field(name, field) {
                Some(value) => Resolved::Value(value),
                None => Resolved::Unresolved,
            };
        }
        if !is_identifier(word) {
            return Resolved::Unresolved;
        }
        match self.values.get(word) {
            Some(Binding::Scalar(value)) => Resolved::Value(value),
            Some(Binding::Object(object)) => Resolved::Object(object),
            None => Resolved::Unresolved,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits `name.field` when both halves are identifiers.
pub fn split_field_ref(text: &str) -> Option<(&str, &str)> {
    let (name, field) = text.split_once('.')?;
    if is_identifier(name) && is_identifier(field) {
        Some((name, field))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_write_merges_into_existing_object() {
        let mut env = Environment::new();
        let mut user = Object::new();
        user.insert("name".to_string(), Value::from("Bob"));
        env.assign_object("user", user);

        env.assign_field("user", "age", Value::Number(30.0));

        assert_eq!(env.get_field("user", "name"), Some(&Value::from("Bob")));
        assert_eq!(env.get_field("user", "age"), Some(&Value::Number(30.0)));
    }

    #[test]
    fn field_write_replaces_scalar() {
        let mut env = Environment::new();
        env.assign("point", Value::Number(1.0));
        env.assign_field("point", "x", Value::Number(2.0));
        assert_eq!(env.resolve("point.x"), Resolved::Value(&Value::Number(2.0)));
    }

    #[test]
    fn resolution_rules() {
        let mut env = Environment::new();
        env.assign("x", Value::Number(5.0));
        env.assign_field("user", "name", Value::from("Bob"));

        assert_eq!(env.resolve("x"), Resolved::Value(&Value::Number(5.0)));
        assert_eq!(env.resolve("user.name"), Resolved::Value(&Value::from("Bob")));
        assert_eq!(env.resolve("user.age"), Resolved::Unresolved);
        assert_eq!(env.resolve("x.name"), Resolved::Unresolved);
        assert_eq!(env.resolve("y"), Resolved::Unresolved);
        assert_eq!(env.resolve("a.b.c"), Resolved::Unresolved);
        assert!(matches!(env.resolve("user"), Resolved::Object(_)));
    }

    #[test]
    fn object_display_sorts_keys() {
        let mut env = Environment::new();
        env.assign_field("user", "name", Value::from("Bob"));
        env.assign_field("user", "age", Value::Number(30.0));
        let shown = env.get("user").map(|b| b.to_string());
        assert_eq!(shown.as_deref(), Some("{age: 30, name: \"Bob\"}"));
    }
}
