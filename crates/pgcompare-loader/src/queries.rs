//! `pg_catalog` queries and their row types.
//!
//! Oids are cast to `int8` and names to `text` so rows decode into plain
//! Rust types. A zero oid means "none".

use sqlx::{FromRow, PgConnection};

pub(crate) const ROLES: &str = "\
    SELECT oid::int8 AS oid, rolname::text AS name
    FROM pg_roles";

pub(crate) const LANGUAGES: &str = "\
    SELECT oid::int8 AS oid, lanname::text AS name, lanowner::int8 AS owner,
           lanispl AS user_defined
    FROM pg_language
    ORDER BY lanname";

pub(crate) const NAMESPACES: &str = "\
    SELECT oid::int8 AS oid, nspname::text AS name, nspowner::int8 AS owner
    FROM pg_namespace
    ORDER BY nspname";

pub(crate) const TYPES: &str = "\
    SELECT a.oid::int8 AS oid, a.typname::text AS name, a.typnamespace::int8 AS namespace,
           a.typowner::int8 AS owner, a.typtype::text AS kind, a.typnotnull AS notnull,
           a.typdefault AS default_value, coalesce(b.typrelid, 0)::int8 AS element_relation,
           a.typbasetype::int8 AS base_type
    FROM pg_type AS a
    LEFT OUTER JOIN pg_type AS b ON a.typelem = b.oid
    WHERE a.typisdefined
    ORDER BY a.typnamespace, a.typname";

pub(crate) const RELATIONS: &str = "\
    SELECT oid::int8 AS oid, relname::text AS name, relowner::int8 AS owner,
           relnamespace::int8 AS namespace, relkind::text AS kind
    FROM pg_class
    WHERE relkind <> 'S'
    ORDER BY relnamespace, relkind, relname";

pub(crate) const COLUMNS: &str = "\
    SELECT attrelid::int8 AS relation, attname::text AS name, atttypid::int8 AS data_type,
           attnum AS position, attnotnull AS notnull,
           pg_get_expr(adbin, adrelid) AS default_value
    FROM pg_attribute
    INNER JOIN pg_class ON attrelid = pg_class.oid
    LEFT OUTER JOIN pg_attrdef ON attrelid = adrelid AND attnum = adnum
    WHERE relkind <> 'S' AND attnum > 0 AND NOT attisdropped
    ORDER BY attrelid, attnum";

pub(crate) const SEQUENCES: &str = "\
    SELECT relname::text AS name, relowner::int8 AS owner, relnamespace::int8 AS namespace,
           seqincrement AS increment, seqmin AS minimum, seqmax AS maximum
    FROM pg_class
    INNER JOIN pg_sequence ON seqrelid = pg_class.oid
    WHERE relkind = 'S'
    ORDER BY relnamespace, relname";

pub(crate) const CONSTRAINTS: &str = "\
    SELECT conname::text AS name, contype::text AS kind, conrelid::int8 AS relation,
           contypid::int8 AS domain, confrelid::int8 AS foreign_relation,
           conkey AS columns, confkey AS foreign_columns,
           pg_get_constraintdef(oid) AS definition
    FROM pg_constraint
    ORDER BY conrelid, contype, conname";

pub(crate) const FUNCTIONS: &str = "\
    SELECT oid::int8 AS oid, proname::text AS name, pronamespace::int8 AS namespace,
           proowner::int8 AS owner, prolang::int8 AS language, prorettype::int8 AS return_type,
           proargtypes::oid[]::int8[] AS arg_types,
           prosrc AS source, probin AS binary
    FROM pg_proc
    ORDER BY pronamespace, proname";

pub(crate) const TRIGGERS: &str = "\
    SELECT tgrelid::int8 AS relation, tgname::text AS name, tgfoid::int8 AS function,
           pg_get_triggerdef(oid) AS definition
    FROM pg_trigger
    WHERE NOT tgisinternal
    ORDER BY tgrelid, tgname";

pub(crate) const RULES: &str = "\
    SELECT rulename::text AS name, ev_class::int8 AS relation,
           pg_get_ruledef(oid) AS definition
    FROM pg_rewrite
    WHERE rulename <> '_RETURN'
    ORDER BY ev_class, rulename";

pub(crate) const OPERATORS: &str = "\
    SELECT oid::int8 AS oid, oprname::text AS name, oprnamespace::int8 AS namespace,
           oprowner::int8 AS owner, oprleft::int8 AS left_type, oprright::int8 AS right_type,
           oprresult::int8 AS result_type
    FROM pg_operator
    ORDER BY oprnamespace, oprname";

pub(crate) const OPCLASSES: &str = "\
    SELECT amname::text AS method, opcname::text AS name, opcnamespace::int8 AS namespace,
           opcowner::int8 AS owner, opcintype::int8 AS input_type, opcdefault AS is_default,
           opckeytype::int8 AS key_type
    FROM pg_opclass
    INNER JOIN pg_am ON opcmethod = pg_am.oid
    ORDER BY opcnamespace, opcname, opcintype, amname";

#[derive(Debug, Clone, FromRow)]
pub struct RoleRow {
    pub oid: i64,
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct LanguageRow {
    pub oid: i64,
    pub name: String,
    pub owner: i64,
    pub user_defined: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct NamespaceRow {
    pub oid: i64,
    pub name: String,
    pub owner: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct TypeRow {
    pub oid: i64,
    pub name: String,
    pub namespace: i64,
    pub owner: i64,
    /// `typtype`: b, c, d, e, p, r or m.
    pub kind: String,
    pub notnull: bool,
    pub default_value: Option<String>,
    /// Row type of the element type, for arrays of composites.
    pub element_relation: i64,
    pub base_type: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct RelationRow {
    pub oid: i64,
    pub name: String,
    pub owner: i64,
    pub namespace: i64,
    /// `relkind`.
    pub kind: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ColumnRow {
    pub relation: i64,
    pub name: String,
    pub data_type: i64,
    pub position: i16,
    pub notnull: bool,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SequenceRow {
    pub name: String,
    pub owner: i64,
    pub namespace: i64,
    pub increment: i64,
    pub minimum: i64,
    pub maximum: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ConstraintRow {
    pub name: String,
    /// `contype`.
    pub kind: String,
    pub relation: i64,
    pub domain: i64,
    pub foreign_relation: i64,
    pub columns: Option<Vec<i16>>,
    pub foreign_columns: Option<Vec<i16>>,
    pub definition: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct FunctionRow {
    pub oid: i64,
    pub name: String,
    pub namespace: i64,
    pub owner: i64,
    pub language: i64,
    pub return_type: i64,
    pub arg_types: Vec<i64>,
    pub source: Option<String>,
    pub binary: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TriggerRow {
    pub relation: i64,
    pub name: String,
    pub function: i64,
    pub definition: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct RuleRow {
    pub name: String,
    pub relation: i64,
    pub definition: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct OperatorRow {
    pub oid: i64,
    pub name: String,
    pub namespace: i64,
    pub owner: i64,
    pub left_type: i64,
    pub right_type: i64,
    pub result_type: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct OpclassRow {
    pub method: String,
    pub name: String,
    pub namespace: i64,
    pub owner: i64,
    pub input_type: i64,
    pub is_default: bool,
    pub key_type: i64,
}

/// Every catalog row needed to build one snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogRows {
    pub roles: Vec<RoleRow>,
    pub languages: Vec<LanguageRow>,
    pub namespaces: Vec<NamespaceRow>,
    pub types: Vec<TypeRow>,
    pub relations: Vec<RelationRow>,
    pub columns: Vec<ColumnRow>,
    pub sequences: Vec<SequenceRow>,
    pub constraints: Vec<ConstraintRow>,
    pub functions: Vec<FunctionRow>,
    pub triggers: Vec<TriggerRow>,
    pub rules: Vec<RuleRow>,
    pub operators: Vec<OperatorRow>,
    pub opclasses: Vec<OpclassRow>,
}

async fn fetch<T>(conn: &mut PgConnection, sql: &'static str) -> Result<Vec<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    sqlx::query_as::<_, T>(sql).fetch_all(conn).await
}

impl CatalogRows {
    /// Run every catalog query on an open transaction.
    pub async fn fetch(conn: &mut PgConnection) -> Result<Self, sqlx::Error> {
        Ok(Self {
            roles: fetch(conn, ROLES).await?,
            languages: fetch(conn, LANGUAGES).await?,
            namespaces: fetch(conn, NAMESPACES).await?,
            types: fetch(conn, TYPES).await?,
            relations: fetch(conn, RELATIONS).await?,
            columns: fetch(conn, COLUMNS).await?,
            sequences: fetch(conn, SEQUENCES).await?,
            constraints: fetch(conn, CONSTRAINTS).await?,
            functions: fetch(conn, FUNCTIONS).await?,
            triggers: fetch(conn, TRIGGERS).await?,
            rules: fetch(conn, RULES).await?,
            operators: fetch(conn, OPERATORS).await?,
            opclasses: fetch(conn, OPCLASSES).await?,
        })
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.roles.len()
            + self.languages.len()
            + self.namespaces.len()
            + self.types.len()
            + self.relations.len()
            + self.columns.len()
            + self.sequences.len()
            + self.constraints.len()
            + self.functions.len()
            + self.triggers.len()
            + self.rules.len()
            + self.operators.len()
            + self.opclasses.len()
    }

    /// Check if no rows were fetched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
