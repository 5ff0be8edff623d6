use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use surrealdb_types::SurrealValue;

/// Stored row for a document (`text` table).
#[derive(Debug, Clone, Serialize, Deserialize, SurrealValue, PartialEq, Eq)]
#[surreal(crate = "surrealdb_types")]
pub struct TextNode {
    pub key: String,
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, SurrealValue, PartialEq, Eq)]
#[surreal(crate = "surrealdb_types")]
pub struct SectionNode {
    pub key: String,
    pub document_id: String,
    pub order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, SurrealValue, PartialEq, Eq)]
#[surreal(crate = "surrealdb_types")]
pub struct PhraseNode {
    pub key: String,
    pub document_id: String,
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segnum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, SurrealValue, PartialEq, Eq)]
#[surreal(crate = "surrealdb_types")]
pub struct WordNode {
    pub key: String,
    pub document_id: String,
    pub surface_form: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub is_punctuation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloss_language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, SurrealValue, PartialEq, Eq)]
#[surreal(crate = "surrealdb_types")]
pub struct MorphemeNode {
    pub key: String,
    pub document_id: String,
    pub morph_type: String,
    pub surface_form: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloss_language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, SurrealValue, PartialEq, Eq)]
#[surreal(crate = "surrealdb_types")]
pub struct GlossNode {
    pub key: String,
    pub document_id: String,
    pub kind: String,
    pub target_kind: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Generic relation row between two node keys.
///
/// `kind` names the relation table; `order` is set for ordered relations.
#[derive(Debug, Clone, Serialize, Deserialize, SurrealValue, PartialEq, Eq)]
#[surreal(crate = "surrealdb_types")]
pub struct RelationRecord {
    pub kind: String,
    pub from_key: String,
    pub to_key: String,
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

pub type SectionPartOfTextEdge = RelationRecord;
pub type PhraseInSectionEdge = RelationRecord;
pub type SectionHasWordEdge = RelationRecord;
pub type PhraseComposedOfEdge = RelationRecord;
pub type WordMadeOfEdge = RelationRecord;
pub type AnalyzesEdge = RelationRecord;

/// A node upsert payload, tagged by node kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeRecord {
    Text(TextNode),
    Section(SectionNode),
    Phrase(PhraseNode),
    Word(WordNode),
    Morpheme(MorphemeNode),
    Gloss(GlossNode),
}

impl NodeRecord {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Text(node) => &node.key,
            Self::Section(node) => &node.key,
            Self::Phrase(node) => &node.key,
            Self::Word(node) => &node.key,
            Self::Morpheme(node) => &node.key,
            Self::Gloss(node) => &node.key,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    UpsertNode(NodeRecord),
    UpsertEdge(RelationRecord),
}

/// Ordered upserts for one document. Applying a batch replaces the document's
/// whole stored subtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteBatch {
    pub document_id: String,
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub const fn new(document_id: String) -> Self {
        Self {
            document_id,
            ops: Vec::new(),
        }
    }

    pub fn upsert_node(&mut self, node: NodeRecord) {
        self.ops.push(WriteOp::UpsertNode(node));
    }

    pub fn upsert_edge(&mut self, edge: RelationRecord) {
        self.ops.push(WriteOp::UpsertEdge(edge));
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, WriteOp::UpsertNode(_)))
            .count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.ops.len() - self.node_count()
    }

    /// Collapses the batch into the subgraph it stores.
    ///
    /// Repeated keys overwrite earlier rows in place. Returns `None` when the
    /// batch has no document node.
    #[must_use]
    pub fn to_subgraph(&self) -> Option<Subgraph> {
        let mut text = None;
        let mut sections = Rows::default();
        let mut phrases = Rows::default();
        let mut words = Rows::default();
        let mut morphemes = Rows::default();
        let mut glosses = Rows::default();
        let mut relations = Rows::default();

        for op in &self.ops {
            match op {
                WriteOp::UpsertNode(NodeRecord::Text(node)) => text = Some(node.clone()),
                WriteOp::UpsertNode(NodeRecord::Section(node)) => {
                    sections.upsert(node.key.clone(), node.clone());
                }
                WriteOp::UpsertNode(NodeRecord::Phrase(node)) => {
                    phrases.upsert(node.key.clone(), node.clone());
                }
                WriteOp::UpsertNode(NodeRecord::Word(node)) => {
                    words.upsert(node.key.clone(), node.clone());
                }
                WriteOp::UpsertNode(NodeRecord::Morpheme(node)) => {
                    morphemes.upsert(node.key.clone(), node.clone());
                }
                WriteOp::UpsertNode(NodeRecord::Gloss(node)) => {
                    glosses.upsert(node.key.clone(), node.clone());
                }
                WriteOp::UpsertEdge(edge) => {
                    let key = format!("{}|{}|{}", edge.kind, edge.from_key, edge.to_key);
                    relations.upsert(key, edge.clone());
                }
            }
        }

        Some(Subgraph {
            text: text?,
            sections: sections.rows,
            phrases: phrases.rows,
            words: words.rows,
            morphemes: morphemes.rows,
            glosses: glosses.rows,
            relations: relations.rows,
        })
    }
}

/// Every stored row belonging to one document, as returned by a store read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subgraph {
    pub text: TextNode,
    #[serde(default)]
    pub sections: Vec<SectionNode>,
    #[serde(default)]
    pub phrases: Vec<PhraseNode>,
    #[serde(default)]
    pub words: Vec<WordNode>,
    #[serde(default)]
    pub morphemes: Vec<MorphemeNode>,
    #[serde(default)]
    pub glosses: Vec<GlossNode>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
}

impl Subgraph {
    pub fn relations_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a RelationRecord> {
        self.relations
            .iter()
            .filter(move |relation| relation.kind == kind)
    }
}

struct Rows<T> {
    rows: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for Rows<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Rows<T> {
    fn upsert(&mut self, key: String, row: T) {
        if let Some(&position) = self.index.get(&key) {
            self.rows[position] = row;
        } else {
            self.index.insert(key, self.rows.len());
            self.rows.push(row);
        }
    }
}
