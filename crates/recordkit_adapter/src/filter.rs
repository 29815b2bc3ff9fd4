//! Structured record filters.
//!
//! Filters are plain data: equality-style conditions, an ordering, and a
//! skip/limit window. There is no query language to parse.

use crate::id::RecordId;
use recordkit_value::{Record, Value};
use std::cmp::Ordering;

/// The attribute name that addresses a record's id in conditions and orders.
pub const ID_ATTRIBUTE: &str = "id";

/// A condition on one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Attribute equals the value.
    Eq(Value),
    /// Attribute differs from the value.
    Ne(Value),
    /// Attribute equals one of the values.
    In(Vec<Value>),
}

impl Condition {
    /// Tests a value against this condition. Missing attributes read as null.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Condition::Eq(expected) => value == expected,
            Condition::Ne(expected) => value != expected,
            Condition::In(values) => values.contains(value),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

/// One ordering term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Attribute to sort by.
    pub attribute: String,
    /// Sort direction.
    pub direction: Direction,
}

impl Order {
    /// Ascending order on an attribute.
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: Direction::Asc,
        }
    }

    /// Descending order on an attribute.
    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: Direction::Desc,
        }
    }
}

/// Selection, ordering and windowing of records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    /// Conditions, all of which must hold.
    pub conditions: Vec<(String, Condition)>,
    /// Ordering terms. Ties (and an empty ordering) fall back to ascending id.
    pub order: Vec<Order>,
    /// Number of matching records to skip.
    pub skip: usize,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl Filter {
    /// Creates a filter matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality condition.
    #[must_use]
    pub fn where_eq(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((attribute.into(), Condition::Eq(value.into())));
        self
    }

    /// Adds an arbitrary condition.
    #[must_use]
    pub fn where_cond(mut self, attribute: impl Into<String>, condition: Condition) -> Self {
        self.conditions.push((attribute.into(), condition));
        self
    }

    /// Appends an ordering term.
    #[must_use]
    pub fn order_by(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    /// Sets the number of records to skip.
    #[must_use]
    pub const fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the maximum number of records to return.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns whether a record satisfies every condition.
    pub fn matches(&self, id: RecordId, data: &Record) -> bool {
        self.conditions.iter().all(|(attribute, condition)| {
            if attribute == ID_ATTRIBUTE {
                condition.matches(&Value::from(id))
            } else {
                condition.matches(data.get(attribute).unwrap_or(&Value::Null))
            }
        })
    }

    /// Compares two records by this filter's ordering, tie-breaking on id.
    pub fn compare(&self, a: (RecordId, &Record), b: (RecordId, &Record)) -> Ordering {
        for term in &self.order {
            let ord = if term.attribute == ID_ATTRIBUTE {
                a.0.cmp(&b.0)
            } else {
                let av = a.1.get(&term.attribute).unwrap_or(&Value::Null);
                let bv = b.1.get(&term.attribute).unwrap_or(&Value::Null);
                av.cmp(bv)
            };
            let ord = match term.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.0.cmp(&b.0)
    }

    /// Returns this filter without its skip/limit window.
    #[must_use]
    pub fn unwindowed(&self) -> Self {
        Self {
            conditions: self.conditions.clone(),
            order: self.order.clone(),
            skip: 0,
            limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordkit_value::record;

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(RecordId::new(1), &Record::new()));
    }

    #[test]
    fn missing_attribute_reads_as_null() {
        let filter = Filter::new().where_eq("name", Value::Null);
        assert!(filter.matches(RecordId::new(1), &Record::new()));
        assert!(!filter.matches(RecordId::new(1), &record! { "name" => "Ann" }));
    }

    #[test]
    fn id_condition() {
        let filter = Filter::new().where_cond("id", Condition::Ne(Value::Integer(3)));
        assert!(filter.matches(RecordId::new(2), &Record::new()));
        assert!(!filter.matches(RecordId::new(3), &Record::new()));
    }

    #[test]
    fn in_condition() {
        let filter =
            Filter::new().where_cond("age", Condition::In(vec![Value::Integer(1), Value::Integer(2)]));
        assert!(filter.matches(RecordId::new(1), &record! { "age" => 2 }));
        assert!(!filter.matches(RecordId::new(1), &record! { "age" => 3 }));
    }

    #[test]
    fn ordering_ties_break_on_id() {
        let filter = Filter::new().order_by(Order::desc("age"));
        let a = record! { "age" => 5 };
        let b = record! { "age" => 5 };
        let c = record! { "age" => 9 };
        assert_eq!(
            filter.compare((RecordId::new(1), &a), (RecordId::new(2), &b)),
            Ordering::Less
        );
        assert_eq!(
            filter.compare((RecordId::new(1), &a), (RecordId::new(3), &c)),
            Ordering::Greater
        );
    }

    #[test]
    fn unwindowed_drops_skip_and_limit() {
        let filter = Filter::new().where_eq("a", 1).skip(3).limit(4);
        let plain = filter.unwindowed();
        assert_eq!(plain.skip, 0);
        assert_eq!(plain.limit, None);
        assert_eq!(plain.conditions.len(), 1);
    }
}
