use std::collections::BTreeMap;
use std::sync::Arc;

use igt_store::models::{
    GlossNode,
    MorphemeNode,
    PhraseNode,
    RelationRecord,
    SectionNode,
    Subgraph,
    TextNode,
    WordNode,
    WriteBatch,
};
use igt_store::schema::{
    NODE_TABLES,
    RELATION_TABLES,
    TABLE_GLOSS,
    TABLE_MORPHEME,
    TABLE_PHRASE,
    TABLE_SECTION,
    TABLE_TEXT,
    TABLE_WORD,
};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{GraphStore, StoreError, StoreResult, ensure_non_empty, validate_batch};

const READ_DOCUMENT: &str = "
SELECT key, document_id, title, source, comment, language_code FROM text WHERE document_id = $document_id;
SELECT key, document_id, `order` FROM section WHERE document_id = $document_id;
SELECT key, document_id, `order`, segnum, surface_text, language FROM phrase WHERE document_id = $document_id;
SELECT key, document_id, surface_form, gloss, pos, language, is_punctuation, guid, gloss_language FROM word WHERE document_id = $document_id;
SELECT key, document_id, morph_type, surface_form, citation_form, gloss, msa, language, guid, gloss_language FROM morpheme WHERE document_id = $document_id;
SELECT key, document_id, kind, target_kind, text, language FROM gloss WHERE document_id = $document_id;
SELECT kind, from_key, to_key, document_id, `order` FROM section_part_of_text WHERE document_id = $document_id;
SELECT kind, from_key, to_key, document_id, `order` FROM phrase_in_section WHERE document_id = $document_id;
SELECT kind, from_key, to_key, document_id, `order` FROM section_has_word WHERE document_id = $document_id;
SELECT kind, from_key, to_key, document_id, `order` FROM phrase_composed_of WHERE document_id = $document_id;
SELECT kind, from_key, to_key, document_id, `order` FROM word_made_of WHERE document_id = $document_id;
SELECT kind, from_key, to_key, document_id, `order` FROM analyzes WHERE document_id = $document_id;
";

const RELATION_STATEMENT_OFFSET: usize = 6;

/// `SurrealDB` store with one table per node kind and one per relation.
pub struct SurrealGraphStore<C: Connection> {
    db: Arc<Surreal<C>>,
    schema: Arc<OnceCell<()>>,
}

impl<C: Connection> Clone for SurrealGraphStore<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl<C: Connection> SurrealGraphStore<C> {
    #[must_use]
    pub fn new(db: Surreal<C>) -> Self {
        Self::from_arc(Arc::new(db))
    }

    #[must_use]
    pub fn from_arc(db: Arc<Surreal<C>>) -> Self {
        Self {
            db,
            schema: Arc::new(OnceCell::new()),
        }
    }

    #[must_use]
    pub fn db(&self) -> &Surreal<C> {
        &self.db
    }

    /// Defines every table and its `document_id` index once per store.
    ///
    /// # Errors
    /// Returns `StoreError` if a definition statement fails.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        self.schema
            .get_or_try_init(|| async {
                let mut sql = String::new();
                for table in NODE_TABLES.iter().chain(RELATION_TABLES.iter()) {
                    sql.push_str(&format!("DEFINE TABLE IF NOT EXISTS {table} SCHEMALESS;\n"));
                    sql.push_str(&format!(
                        "DEFINE INDEX IF NOT EXISTS {table}_document ON TABLE {table} FIELDS document_id;\n"
                    ));
                }
                self.db.query(sql).await?.check()?;
                debug!("graph tables defined");
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }
}

impl<C: Connection> GraphStore for SurrealGraphStore<C> {
    async fn write_document(&self, batch: WriteBatch) -> StoreResult<()> {
        let subgraph = validate_batch(&batch)?;
        self.ensure_schema().await?;

        let Subgraph {
            text,
            sections,
            phrases,
            words,
            morphemes,
            glosses,
            relations,
        } = subgraph;

        let mut relation_groups: BTreeMap<&'static str, Vec<RelationRecord>> = BTreeMap::new();
        for relation in relations {
            let Some(table) = RELATION_TABLES.iter().find(|table| **table == relation.kind) else {
                return Err(StoreError::InvalidInput(format!(
                    "unknown relation kind {}",
                    relation.kind
                )));
            };
            relation_groups.entry(*table).or_default().push(relation);
        }

        let mut inserts = vec![TABLE_TEXT];
        for (table, empty) in [
            (TABLE_SECTION, sections.is_empty()),
            (TABLE_PHRASE, phrases.is_empty()),
            (TABLE_WORD, words.is_empty()),
            (TABLE_MORPHEME, morphemes.is_empty()),
            (TABLE_GLOSS, glosses.is_empty()),
        ] {
            if !empty {
                inserts.push(table);
            }
        }
        inserts.extend(relation_groups.keys().copied());

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        for table in NODE_TABLES.iter().chain(RELATION_TABLES.iter()) {
            sql.push_str(&format!("DELETE {table} WHERE document_id = $document_id;\n"));
        }
        for table in &inserts {
            sql.push_str(&format!("INSERT INTO {table} ${table};\n"));
        }
        sql.push_str("COMMIT TRANSACTION;\n");

        let row_count = 1 + sections.len() + phrases.len() + words.len() + morphemes.len() + glosses.len();
        let mut query = self
            .db
            .query(sql)
            .bind(("document_id", batch.document_id.clone()))
            .bind((TABLE_TEXT, vec![text]));
        if !sections.is_empty() {
            query = query.bind((TABLE_SECTION, sections));
        }
        if !phrases.is_empty() {
            query = query.bind((TABLE_PHRASE, phrases));
        }
        if !words.is_empty() {
            query = query.bind((TABLE_WORD, words));
        }
        if !morphemes.is_empty() {
            query = query.bind((TABLE_MORPHEME, morphemes));
        }
        if !glosses.is_empty() {
            query = query.bind((TABLE_GLOSS, glosses));
        }
        let edge_count: usize = relation_groups.values().map(Vec::len).sum();
        for (table, rows) in relation_groups {
            query = query.bind((table, rows));
        }
        query.await?.check()?;

        debug!(
            document_id = %batch.document_id,
            rows = row_count,
            edges = edge_count,
            "replaced document subgraph"
        );
        Ok(())
    }

    async fn read_document(&self, document_id: &str) -> StoreResult<Option<Subgraph>> {
        ensure_non_empty(document_id, "document_id")?;
        self.ensure_schema().await?;

        let mut response = self
            .db
            .query(READ_DOCUMENT)
            .bind(("document_id", document_id.to_string()))
            .await?
            .check()?;

        let mut texts: Vec<TextNode> = response.take(0)?;
        let Some(text) = texts.pop() else {
            return Ok(None);
        };
        let sections: Vec<SectionNode> = response.take(1)?;
        let phrases: Vec<PhraseNode> = response.take(2)?;
        let words: Vec<WordNode> = response.take(3)?;
        let morphemes: Vec<MorphemeNode> = response.take(4)?;
        let glosses: Vec<GlossNode> = response.take(5)?;
        let mut relations = Vec::new();
        for index in 0..RELATION_TABLES.len() {
            let rows: Vec<RelationRecord> = response.take(RELATION_STATEMENT_OFFSET + index)?;
            relations.extend(rows);
        }

        Ok(Some(Subgraph {
            text,
            sections,
            phrases,
            words,
            morphemes,
            glosses,
            relations,
        }))
    }

    async fn list_documents(&self, limit: usize) -> StoreResult<Vec<TextNode>> {
        let limit = limit_to_i64(limit)?;
        self.ensure_schema().await?;
        let query = "SELECT key, document_id, title, source, comment, language_code FROM text ORDER BY key LIMIT $limit;";
        let mut response = self.db.query(query).bind(("limit", limit)).await?;
        let records: Vec<TextNode> = response.take(0)?;
        Ok(records)
    }

    async fn document_ids(&self) -> StoreResult<Vec<String>> {
        self.ensure_schema().await?;
        let query = "SELECT key FROM text ORDER BY key;";
        let mut response = self.db.query(query).await?;
        let records: Vec<KeyRow> = response.take(0)?;
        let mut keys: Vec<String> = records.into_iter().map(|row| row.key).collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[derive(serde::Deserialize, SurrealValue)]
#[surreal(crate = "surrealdb_types")]
struct KeyRow {
    key: String,
}

fn limit_to_i64(limit: usize) -> StoreResult<i64> {
    i64::try_from(limit).map_err(|_| {
        StoreError::InvalidInput("limit exceeds supported range".to_string())
    })
}
