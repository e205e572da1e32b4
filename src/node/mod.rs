//! The denormalization engine: relation node trees that rebuild nested
//! entities from flat, join-duplicated rows.
//!
//! A [`Node`] describes one level of the output tree: which columns to
//! project (optionally aliased), which columns identify a record at that
//! level, and the named child relations. [`Node::parse_rows`] walks every
//! input row once, deduplicating records per level through an
//! order-preserving [`Index`] and attaching child relation results.
//!
//! [`SimpleNode`] is the pass-through root for result sets without
//! relations: it projects columns per row with no indexing overhead.

mod index;

pub(crate) use index::Index;

use crate::error::Error;
use crate::Row;
use serde_json::Value;

/// A projected column: source name plus the alias used in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub(crate) alias: String,
    pub(crate) name: String,
}

impl Column {
    /// Column projected under its own name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Column {
            alias: name.clone(),
            name,
        }
    }

    /// Column projected under a different name.
    pub fn aliased(alias: impl Into<String>, name: impl Into<String>) -> Self {
        Column {
            alias: alias.into(),
            name: name.into(),
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::named(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::named(name)
    }
}

impl From<(&str, &str)> for Column {
    fn from((alias, name): (&str, &str)) -> Self {
        Column::aliased(alias, name)
    }
}

impl From<(String, String)> for Column {
    fn from((alias, name): (String, String)) -> Self {
        Column::aliased(alias, name)
    }
}

/// How a child relation reads back from its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelationKind {
    /// One-to-one: first record or null.
    Item,
    /// One-to-many: the full ordered list of records.
    Collection,
}

#[derive(Debug, Clone)]
struct Relation {
    name: String,
    kind: RelationKind,
    node: Node,
}

/// Immutable relational schema element describing one level of the
/// nested output tree.
///
/// Built once through [`Node::builder`] and reused across any number of
/// parse calls; every call owns a fresh index tree.
#[derive(Debug, Clone)]
pub struct Node {
    columns: Vec<Column>,
    primary_key: Vec<Column>,
    relations: Vec<Relation>,
}

impl Node {
    pub fn builder<I, C, K, S>(columns: I, primary_key: K) -> NodeBuilder
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
        K: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NodeBuilder {
            columns: columns.into_iter().map(Into::into).collect(),
            primary_key: primary_key.into_iter().map(Into::into).collect(),
            relations: Vec::new(),
        }
    }

    /// Parses all rows, deduplicating by primary key at every level.
    ///
    /// Records are emitted in first-seen order of each distinct root key.
    /// The whole input is materialized before anything is returned:
    /// duplicates of a root key can occur arbitrarily far apart in a join
    /// result.
    pub fn parse_rows<I>(&self, rows: I) -> Result<Vec<Row>, Error>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut index = Index::default();

        for row in rows {
            self.parse_relational_row(&row, &mut index)?;
        }

        Ok(index.into_records())
    }

    /// Parses a single row with a throwaway index.
    ///
    /// Returns [`Error::EmptyResult`] when the row's primary key is null:
    /// a root row is never optional.
    pub fn parse_row(&self, row: Row) -> Result<Row, Error> {
        let mut index = Index::default();

        self.parse_relational_row(&row, &mut index)?;

        index.into_first().ok_or(Error::EmptyResult)
    }

    fn parse_relational_row(&self, row: &Row, index: &mut Index) -> Result<(), Error> {
        let primary_key = project(row, &self.primary_key)?;

        if primary_key.values().any(Value::is_null) {
            // empty relation, nothing to parse
            return Ok(());
        }

        let mut item = match index.find(&primary_key) {
            Some(existing) => existing.clone(),
            None => project(row, &self.columns)?,
        };

        for relation in &self.relations {
            let nested = index.nested_index(&relation.name, &primary_key);

            relation.node.parse_relational_row(row, nested)?;

            let result = match relation.kind {
                RelationKind::Item => nested
                    .find_first()
                    .cloned()
                    .map(Value::Object)
                    .unwrap_or(Value::Null),
                RelationKind::Collection => {
                    Value::Array(nested.find_all().into_iter().map(Value::Object).collect())
                }
            };

            item.insert(relation.name.clone(), result);
        }

        index.set(&primary_key, item);

        Ok(())
    }
}

/// Builder for a [`Node`] tree.
///
/// Relations are attached with [`join_item`](NodeBuilder::join_item) and
/// [`join_collection`](NodeBuilder::join_collection); [`build`](NodeBuilder::build)
/// validates the whole tree and produces the immutable snapshot.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    columns: Vec<Column>,
    primary_key: Vec<String>,
    relations: Vec<(String, RelationKind, NodeBuilder)>,
}

impl NodeBuilder {
    /// Joins a one-to-one relation: reads back as a single record or null.
    pub fn join_item(mut self, name: impl Into<String>, node: NodeBuilder) -> Self {
        self.relations.push((name.into(), RelationKind::Item, node));
        self
    }

    /// Joins a one-to-many relation: reads back as an ordered list.
    pub fn join_collection(mut self, name: impl Into<String>, node: NodeBuilder) -> Self {
        self.relations
            .push((name.into(), RelationKind::Collection, node));
        self
    }

    pub fn build(self) -> Result<Node, Error> {
        if self.columns.is_empty() {
            return Err(Error::EmptyColumns);
        }

        if self.primary_key.is_empty() {
            return Err(Error::EmptyPrimaryKey);
        }

        let relations = self
            .relations
            .into_iter()
            .map(|(name, kind, builder)| {
                Ok(Relation {
                    name,
                    kind,
                    node: builder.build()?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Node {
            columns: self.columns,
            primary_key: self.primary_key.into_iter().map(Column::named).collect(),
            relations,
        })
    }
}

/// Pass-through root node for result sets without relations: projects the
/// declared columns per row without any indexing or deduplication.
#[derive(Debug, Clone)]
pub struct SimpleNode {
    columns: Vec<Column>,
}

impl SimpleNode {
    pub fn new<I, C>(columns: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        let columns: Vec<Column> = columns.into_iter().map(Into::into).collect();

        if columns.is_empty() {
            return Err(Error::EmptyColumns);
        }

        Ok(SimpleNode { columns })
    }

    pub fn parse_row(&self, row: &Row) -> Result<Row, Error> {
        project(row, &self.columns)
    }

    pub fn parse_rows<I>(&self, rows: I) -> Result<Vec<Row>, Error>
    where
        I: IntoIterator<Item = Row>,
    {
        rows.into_iter().map(|row| self.parse_row(&row)).collect()
    }
}

fn project(row: &Row, columns: &[Column]) -> Result<Row, Error> {
    let mut result = Row::new();

    for column in columns {
        let value = row.get(&column.name).ok_or_else(|| Error::UnknownColumn {
            name: column.name.clone(),
        })?;

        result.insert(column.alias.clone(), value.clone());
    }

    Ok(result)
}
