//! Condition, key-condition and update expressions with generated placeholders.

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;

use crate::Item;
use crate::errors::{Error, Result};

/// A rendered expression plus the placeholders it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    pub text: String,
    pub names: HashMap<String, String>,
    pub values: Item,
}

impl Expression {
    /// A raw expression with no placeholders.
    pub fn raw(text: impl Into<String>) -> Self {
        Expression {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, placeholder: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(placeholder.into(), name.into());
        self
    }

    pub fn with_value(mut self, placeholder: impl Into<String>, value: AttributeValue) -> Self {
        self.values.insert(placeholder.into(), value);
        self
    }

    /// Merge the placeholders of several expressions into one pair of maps.
    ///
    /// A placeholder may repeat only if it is bound to the same name or value
    /// every time; a conflicting binding is a validation error.
    pub fn merged_placeholders<'a>(
        expressions: impl IntoIterator<Item = &'a Expression>,
    ) -> Result<(HashMap<String, String>, Item)> {
        let mut names: HashMap<String, String> = HashMap::new();
        let mut values = Item::new();
        for expr in expressions {
            for (placeholder, name) in &expr.names {
                match names.get(placeholder) {
                    Some(existing) if existing != name => {
                        return Err(placeholder_conflict(placeholder));
                    }
                    Some(_) => {}
                    None => {
                        names.insert(placeholder.clone(), name.clone());
                    }
                }
            }
            for (placeholder, value) in &expr.values {
                match values.get(placeholder) {
                    Some(existing) if existing != value => {
                        return Err(placeholder_conflict(placeholder));
                    }
                    Some(_) => {}
                    None => {
                        values.insert(placeholder.clone(), value.clone());
                    }
                }
            }
        }
        Ok((names, values))
    }
}

fn placeholder_conflict(placeholder: &str) -> Error {
    Error::Validation(format!(
        "placeholder '{}' is bound twice with different values; build conditions with distinct prefixes",
        placeholder
    ))
}

/// A small condition language covering what the CLI needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, AttributeValue),
    BeginsWith(String, AttributeValue),
    AttributeExists(String),
    AttributeNotExists(String),
    And(Box<Condition>, Box<Condition>),
}

impl Condition {
    pub fn eq(attr: impl Into<String>, value: AttributeValue) -> Self {
        Condition::Eq(attr.into(), value)
    }

    pub fn begins_with(attr: impl Into<String>, value: AttributeValue) -> Self {
        Condition::BeginsWith(attr.into(), value)
    }

    pub fn attribute_exists(attr: impl Into<String>) -> Self {
        Condition::AttributeExists(attr.into())
    }

    pub fn attribute_not_exists(attr: impl Into<String>) -> Self {
        Condition::AttributeNotExists(attr.into())
    }

    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    /// Render with placeholders `#<prefix>N` and `:<prefix>N`.
    ///
    /// Use distinct prefixes for expressions sent in the same request. The
    /// crate itself uses `k` (key conditions and the implicit insert
    /// condition), `c` (existence checks), `q` and `s` (query and scan
    /// filters), and `#f`/`:v` in [`set_expression`].
    pub fn build(&self, prefix: &str) -> Expression {
        let mut renderer = Renderer {
            prefix,
            next: 0,
            out: Expression::default(),
        };
        let text = renderer.render(self);
        Expression {
            text,
            ..renderer.out
        }
    }
}

struct Renderer<'a> {
    prefix: &'a str,
    next: usize,
    out: Expression,
}

impl Renderer<'_> {
    fn name(&mut self, attr: &str) -> String {
        // Reuse the placeholder when an attribute appears twice.
        if let Some(placeholder) = self
            .out
            .names
            .iter()
            .find(|(_, name)| name.as_str() == attr)
            .map(|(placeholder, _)| placeholder.clone())
        {
            return placeholder;
        }
        let placeholder = format!("#{}{}", self.prefix, self.next);
        self.next += 1;
        self.out.names.insert(placeholder.clone(), attr.to_string());
        placeholder
    }

    fn value(&mut self, value: &AttributeValue) -> String {
        let placeholder = format!(":{}{}", self.prefix, self.next);
        self.next += 1;
        self.out.values.insert(placeholder.clone(), value.clone());
        placeholder
    }

    fn render(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Eq(attr, value) => {
                let n = self.name(attr);
                let v = self.value(value);
                format!("{} = {}", n, v)
            }
            Condition::BeginsWith(attr, value) => {
                let n = self.name(attr);
                let v = self.value(value);
                format!("begins_with({}, {})", n, v)
            }
            Condition::AttributeExists(attr) => {
                format!("attribute_exists({})", self.name(attr))
            }
            Condition::AttributeNotExists(attr) => {
                format!("attribute_not_exists({})", self.name(attr))
            }
            Condition::And(left, right) => {
                let l = self.render(left);
                let r = self.render(right);
                format!("{} AND {}", l, r)
            }
        }
    }
}

/// `attribute_not_exists` on every key attribute, joined with AND.
///
/// Returns `None` for an empty key.
pub fn not_exists_condition<'a>(key_attributes: impl IntoIterator<Item = &'a str>) -> Option<Condition> {
    let mut attrs: Vec<&str> = key_attributes.into_iter().collect();
    attrs.sort_unstable();
    attrs
        .into_iter()
        .map(Condition::attribute_not_exists)
        .reduce(Condition::and)
}

/// Build a SET update expression from field:value pairs, in the given order.
pub fn set_expression<I, K>(updates: I) -> Expression
where
    I: IntoIterator<Item = (K, AttributeValue)>,
    K: Into<String>,
{
    let mut set_parts = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    for (i, (field, value)) in updates.into_iter().enumerate() {
        let name_placeholder = format!("#f{}", i);
        let value_placeholder = format!(":v{}", i);

        set_parts.push(format!("{} = {}", name_placeholder, value_placeholder));
        names.insert(name_placeholder, field.into());
        values.insert(value_placeholder, value);
    }

    Expression {
        text: format!("SET {}", set_parts.join(", ")),
        names,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_string())
    }

    #[test]
    fn key_condition_with_begins_with() {
        let expr = Condition::eq("Artist", s("No One You Know-1"))
            .and(Condition::begins_with("SongTitle", s("Call Me Today")))
            .build("k");

        assert_eq!(expr.text, "#k0 = :k1 AND begins_with(#k2, :k3)");
        assert_eq!(expr.names["#k0"], "Artist");
        assert_eq!(expr.names["#k2"], "SongTitle");
        assert_eq!(expr.values[":k3"], s("Call Me Today"));
    }

    #[test]
    fn repeated_attribute_reuses_name_placeholder() {
        let expr = Condition::attribute_exists("Artist")
            .and(Condition::eq("Artist", s("x")))
            .build("c");
        assert_eq!(expr.text, "attribute_exists(#c0) AND #c0 = :c1");
        assert_eq!(expr.names.len(), 1);
    }

    #[test]
    fn not_exists_covers_every_key_attribute() {
        let expr = not_exists_condition(["SongTitle", "Artist"]).unwrap().build("k");
        assert_eq!(
            expr.text,
            "attribute_not_exists(#k0) AND attribute_not_exists(#k1)"
        );
        assert_eq!(expr.names["#k0"], "Artist");
        assert!(not_exists_condition([]).is_none());
    }

    #[test]
    fn merge_accepts_identical_bindings() {
        let a = Condition::attribute_exists("Artist").build("c");
        let b = Condition::attribute_exists("Artist").build("c");
        let (names, values) = Expression::merged_placeholders([&a, &b]).unwrap();
        assert_eq!(names.len(), 1);
        assert!(values.is_empty());
    }

    #[test]
    fn merge_rejects_conflicting_name_binding() {
        let update = set_expression([("Length", AttributeValue::N("1".into()))]);
        let condition = Condition::attribute_exists("Artist").build("f");
        assert_eq!(condition.text, "attribute_exists(#f0)");

        let err = Expression::merged_placeholders([&update, &condition]).unwrap_err();
        assert!(matches!(&err, Error::Validation(msg) if msg.contains("#f0")));
    }

    #[test]
    fn merge_rejects_conflicting_value_binding() {
        let a = Expression::raw("#a = :v0").with_value(":v0", s("one"));
        let b = Expression::raw("#b = :v0").with_value(":v0", s("two"));
        assert!(Expression::merged_placeholders([&a, &b]).is_err());
    }

    #[test]
    fn set_expression_keeps_order() {
        let expr = set_expression([
            ("Length", AttributeValue::N("99".into())),
            ("Awards", AttributeValue::N("99".into())),
        ]);
        assert_eq!(expr.text, "SET #f0 = :v0, #f1 = :v1");
        assert_eq!(expr.names["#f1"], "Awards");
    }
}
