//! Diff tree nodes.
//!
//! Every field is optional; a missing field means the sources agree on it.
//! Nodes with no field set are never constructed by the builder.

use super::group::{Grouped, ValueView};
use super::named::NamedList;
use super::ordered::OrderedList;
use crate::catalog::{FlatKey, ObjectKind};
use serde::Serialize;

/// A field of a diff node, as seen by renderers.
#[derive(Debug)]
pub enum Field<'a> {
    /// Grouped attribute values.
    Value(ValueView<'a>),
    /// Named sub-collection.
    Named(&'a NamedList),
    /// Ordered sub-collection.
    Ordered(&'a OrderedList),
}

/// Conversion of node field types into [`Field`].
pub trait AsField {
    fn as_field(&self) -> Field<'_>;
}

impl<T: super::group::RenderValue> AsField for Grouped<T> {
    fn as_field(&self) -> Field<'_> {
        Field::Value(self.view())
    }
}

impl AsField for NamedList {
    fn as_field(&self) -> Field<'_> {
        Field::Named(self)
    }
}

impl AsField for OrderedList {
    fn as_field(&self) -> Field<'_> {
        Field::Ordered(self)
    }
}

macro_rules! diff_node {
    ($(#[$doc:meta])* $name:ident { $($field:ident: $ty:ty,)* }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, Serialize)]
        pub struct $name {
            $(
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl $name {
            /// Check if no field differs.
            pub fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())*
            }

            /// Differing fields in declaration order.
            pub fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
                let mut fields = Vec::new();
                $(
                    if let Some(value) = &self.$field {
                        fields.push((stringify!($field), value.as_field()));
                    }
                )*
                fields
            }
        }
    };
}

diff_node!(
    /// Language differences.
    LanguageDiff {
        owner: Grouped<String>,
    }
);

diff_node!(
    /// Namespace differences, one named list per kind-group.
    NamespaceDiff {
        owner: Grouped<String>,
        types: NamedList,
        relations: NamedList,
        sequences: NamedList,
        functions: NamedList,
        operators: NamedList,
        opclasses: NamedList,
    }
);

diff_node!(
    /// Base type differences.
    TypeDiff {
        owner: Grouped<String>,
        notnull: Grouped<bool>,
        default: Grouped<Option<String>>,
    }
);

diff_node!(
    /// Domain differences.
    DomainDiff {
        owner: Grouped<String>,
        notnull: Grouped<bool>,
        default: Grouped<Option<String>>,
        base_type: Grouped<FlatKey>,
        constraints: NamedList,
    }
);

diff_node!(
    /// Function differences.
    FunctionDiff {
        owner: Grouped<String>,
        language: Grouped<FlatKey>,
        return_type: Grouped<FlatKey>,
        arg_types: Grouped<FlatKey>,
        source: Grouped<Option<String>>,
        binary: Grouped<Option<String>>,
    }
);

diff_node!(
    /// Composite or index differences.
    RelationDiff {
        owner: Grouped<String>,
        columns: OrderedList,
    }
);

diff_node!(
    /// View differences.
    ViewDiff {
        owner: Grouped<String>,
        columns: OrderedList,
        rules: NamedList,
    }
);

diff_node!(
    /// Table differences.
    TableDiff {
        owner: Grouped<String>,
        columns: OrderedList,
        rules: NamedList,
        triggers: NamedList,
        constraints: NamedList,
    }
);

diff_node!(
    /// Sequence differences.
    SequenceDiff {
        owner: Grouped<String>,
        increment: Grouped<i64>,
        minimum: Grouped<i64>,
        maximum: Grouped<i64>,
    }
);

diff_node!(
    /// Column differences.
    ColumnDiff {
        data_type: Grouped<FlatKey>,
        notnull: Grouped<bool>,
        default: Grouped<Option<String>>,
    }
);

diff_node!(
    /// Domain check or unique constraint differences.
    ConstraintDiff {
        definition: Grouped<String>,
    }
);

diff_node!(
    /// Check, unique or primary key constraint differences.
    ColumnConstraintDiff {
        definition: Grouped<String>,
        columns: OrderedList,
    }
);

diff_node!(
    /// Foreign key differences.
    ForeignKeyDiff {
        definition: Grouped<String>,
        columns: OrderedList,
        foreign_table: Grouped<FlatKey>,
        foreign_columns: OrderedList,
    }
);

diff_node!(
    /// Trigger differences.
    TriggerDiff {
        function: Grouped<FlatKey>,
        definition: Grouped<String>,
    }
);

diff_node!(
    /// Rewrite rule differences.
    RuleDiff {
        definition: Grouped<String>,
    }
);

diff_node!(
    /// Operator differences.
    OperatorDiff {
        owner: Grouped<String>,
        left: Grouped<FlatKey>,
        right: Grouped<FlatKey>,
        result: Grouped<FlatKey>,
    }
);

diff_node!(
    /// Operator class differences.
    OperatorClassDiff {
        owner: Grouped<String>,
        input_type: Grouped<FlatKey>,
        default: Grouped<bool>,
        key_type: Grouped<FlatKey>,
    }
);

/// Difference of one matched object, tagged by kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ObjectDiff {
    Language(LanguageDiff),
    Namespace(NamespaceDiff),
    Type(TypeDiff),
    Domain(DomainDiff),
    Function(FunctionDiff),
    Composite(RelationDiff),
    Index(RelationDiff),
    View(ViewDiff),
    Table(TableDiff),
    Sequence(SequenceDiff),
    Column(ColumnDiff),
    CheckConstraint(ConstraintDiff),
    UniqueConstraint(ConstraintDiff),
    CheckColumnConstraint(ColumnConstraintDiff),
    UniqueColumnConstraint(ColumnConstraintDiff),
    PrimaryKey(ColumnConstraintDiff),
    ForeignKey(ForeignKeyDiff),
    Trigger(TriggerDiff),
    Rule(RuleDiff),
    Operator(OperatorDiff),
    OperatorClass(OperatorClassDiff),
    /// The same name denotes different kinds of object across sources.
    KindMismatch(Grouped<ObjectKind>),
}

impl ObjectDiff {
    /// Differing fields of the node.
    pub fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        match self {
            ObjectDiff::Language(d) => d.fields(),
            ObjectDiff::Namespace(d) => d.fields(),
            ObjectDiff::Type(d) => d.fields(),
            ObjectDiff::Domain(d) => d.fields(),
            ObjectDiff::Function(d) => d.fields(),
            ObjectDiff::Composite(d) | ObjectDiff::Index(d) => d.fields(),
            ObjectDiff::View(d) => d.fields(),
            ObjectDiff::Table(d) => d.fields(),
            ObjectDiff::Sequence(d) => d.fields(),
            ObjectDiff::Column(d) => d.fields(),
            ObjectDiff::CheckConstraint(d) | ObjectDiff::UniqueConstraint(d) => d.fields(),
            ObjectDiff::CheckColumnConstraint(d)
            | ObjectDiff::UniqueColumnConstraint(d)
            | ObjectDiff::PrimaryKey(d) => d.fields(),
            ObjectDiff::ForeignKey(d) => d.fields(),
            ObjectDiff::Trigger(d) => d.fields(),
            ObjectDiff::Rule(d) => d.fields(),
            ObjectDiff::Operator(d) => d.fields(),
            ObjectDiff::OperatorClass(d) => d.fields(),
            ObjectDiff::KindMismatch(kinds) => vec![("kind", kinds.as_field())],
        }
    }

    /// Check if this is a kind mismatch.
    pub fn is_kind_mismatch(&self) -> bool {
        matches!(self, ObjectDiff::KindMismatch(_))
    }
}

/// An object present in some sources and absent from others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingObject {
    /// Dotted path from the namespace (or language) down.
    pub path: String,
    pub kind: ObjectKind,
    /// Per-source presence.
    pub present: Vec<bool>,
}

/// Root of the diff tree.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseDiff {
    /// Source labels, in comparison order.
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<NamedList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<NamedList>,
}

impl DatabaseDiff {
    /// Check if all sources agree.
    pub fn is_empty(&self) -> bool {
        self.languages.is_none() && self.namespaces.is_none()
    }

    /// Every object missing from at least one source that has its owner.
    ///
    /// Named entries and owned ordered rows are reported; reference lists
    /// are not.
    pub fn missing(&self) -> Vec<MissingObject> {
        let mut out = Vec::new();
        for list in [&self.languages, &self.namespaces].into_iter().flatten() {
            collect_named(list, "", &mut out);
        }
        out
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn collect_named(list: &NamedList, prefix: &str, out: &mut Vec<MissingObject>) {
    for entry in &list.entries {
        let path = join(prefix, &entry.name);
        if entry.presence.is_partial() {
            out.push(MissingObject {
                path: path.clone(),
                kind: entry.kind,
                present: entry.presence.presence(),
            });
        }
        if let Some(diff) = &entry.diff {
            collect_fields(diff, &path, out);
        }
    }
}

fn collect_fields(diff: &ObjectDiff, prefix: &str, out: &mut Vec<MissingObject>) {
    for (_, field) in diff.fields() {
        match field {
            Field::Value(_) => {}
            Field::Named(list) => collect_named(list, prefix, out),
            Field::Ordered(list) if list.owned => {
                for (name, present) in list.partial_names() {
                    out.push(MissingObject {
                        path: join(prefix, name),
                        kind: ObjectKind::Column,
                        present,
                    });
                }
                for row in &list.rows {
                    if let Some(diff) = &row.diff {
                        collect_fields(diff, &join(prefix, &row.name), out);
                    }
                }
            }
            Field::Ordered(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_node() {
        let node = TypeDiff::default();
        assert!(node.is_empty());
        assert!(node.fields().is_empty());
    }

    #[test]
    fn test_fields_in_declaration_order() {
        let node = TypeDiff {
            owner: Grouped::new(vec![Some("a".to_string()), Some("b".to_string())])
                .into_difference(),
            default: Grouped::new(vec![Some(None), Some(Some("1".to_string()))])
                .into_difference(),
            ..TypeDiff::default()
        };
        let names: Vec<_> = node.fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["owner", "default"]);
    }

    #[test]
    fn test_serialized_kind_tag() {
        let diff = ObjectDiff::Rule(RuleDiff {
            definition: Grouped::new(vec![Some("x".to_string()), Some("y".to_string())])
                .into_difference(),
        });
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["kind"], "rule");
        assert_eq!(json["definition"]["groups"], serde_json::json!([0, 1]));
    }
}
