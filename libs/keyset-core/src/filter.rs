//! Filter set → `AND`-able SQL fragments plus aligned bound parameters.

use std::collections::BTreeMap;

use crate::Value;

/// One filter entry. Built by the caller-facing layer; the compiler never
/// inspects runtime types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Filter {
    Equals(Value),
    /// Set membership. An empty set contributes no predicate at all.
    OneOf(Vec<Value>),
}

/// Physical field name → filter. Ordered by field name so that repeated
/// compilation of the same set yields identical SQL text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSet(BTreeMap<String, Filter>);

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), Filter::Equals(value.into()));
        self
    }

    pub fn one_of<V: Into<Value>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.0.insert(field.into(), Filter::OneOf(values));
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, filter: Filter) {
        self.0.insert(field.into(), filter);
    }

    pub fn get(&self, field: &str) -> Option<&Filter> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Filter)> for FilterSet {
    fn from_iter<T: IntoIterator<Item = (String, Filter)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Output of [`compile`]: `fragments[i]` holds as many `?` as it consumes
/// from `params`, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledFilters {
    pub fragments: Vec<String>,
    pub params: Vec<Value>,
}

/// Compile a filter set.
///
/// Field names are written into the SQL verbatim; callers must only pass names
/// taken from an entity's static allow-list.
pub fn compile(filters: &FilterSet) -> CompiledFilters {
    let mut out = CompiledFilters::default();

    for (field, filter) in filters.iter() {
        match filter {
            Filter::Equals(v) => {
                out.fragments.push(format!("{field} = ?"));
                out.params.push(v.clone());
            }
            Filter::OneOf(values) if values.is_empty() => {}
            Filter::OneOf(values) => {
                let placeholders = vec!["?"; values.len()].join(", ");
                out.fragments.push(format!("{field} IN ({placeholders})"));
                out.params.extend(values.iter().cloned());
            }
        }
    }

    out
}
