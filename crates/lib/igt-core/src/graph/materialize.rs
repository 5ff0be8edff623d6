use std::collections::{BTreeMap, BTreeSet};

use igt_store::models::{
    GlossNode,
    MorphemeNode,
    NodeRecord,
    PhraseNode,
    RelationRecord,
    SectionNode,
    TextNode,
    WordNode,
    WriteBatch,
};
use igt_store::schema::{
    REL_ANALYZES,
    REL_PHRASE_COMPOSED_OF,
    REL_PHRASE_IN_SECTION,
    REL_SECTION_HAS_WORD,
    REL_SECTION_PART_OF_TEXT,
    REL_WORD_MADE_OF,
};
use igt_store::tree::Document;

/// Resolved language per node key, plus the distinct languages seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageIndex {
    by_key: BTreeMap<String, String>,
    languages: BTreeSet<String>,
}

impl LanguageIndex {
    fn record(&mut self, key: &str, language: Option<&String>) {
        if let Some(language) = language {
            self.by_key.insert(key.to_string(), language.clone());
            self.languages.insert(language.clone());
        }
    }

    #[must_use]
    pub fn language_of(&self, key: &str) -> Option<&str> {
        self.by_key.get(key).map(String::as_str)
    }

    #[must_use]
    pub const fn languages(&self) -> &BTreeSet<String> {
        &self.languages
    }
}

/// Write batch for one document together with its language index.
#[derive(Debug, Clone)]
pub struct Materialized {
    pub batch: WriteBatch,
    pub languages: LanguageIndex,
}

/// Projects a document tree onto graph rows.
///
/// Operations are ordered top-down: the document node, then every node in
/// tree order followed by the edge attaching it to its parent, then glosses.
/// The same tree always yields the same batch.
#[must_use]
pub fn materialize(document: &Document) -> Materialized {
    let document_id = document.id.clone();
    let mut batch = WriteBatch::new(document_id.clone());
    let mut languages = LanguageIndex::default();

    batch.upsert_node(NodeRecord::Text(TextNode {
        key: document_id.clone(),
        document_id: document_id.clone(),
        title: document.title.clone(),
        source: document.source.clone(),
        comment: document.comment.clone(),
        language_code: document.default_language.clone(),
    }));
    languages.record(&document_id, document.default_language.as_ref());

    let edge = |kind: &str, from: &str, to: &str, order: Option<i64>| RelationRecord {
        kind: kind.to_string(),
        from_key: from.to_string(),
        to_key: to.to_string(),
        document_id: document_id.clone(),
        order,
    };

    for section in &document.sections {
        batch.upsert_node(NodeRecord::Section(SectionNode {
            key: section.id.clone(),
            document_id: document_id.clone(),
            order: i64::from(section.order),
        }));
        batch.upsert_edge(edge(
            REL_SECTION_PART_OF_TEXT,
            &document_id,
            &section.id,
            Some(i64::from(section.order)),
        ));

        let mut section_word_index = 0_i64;
        for phrase in &section.phrases {
            batch.upsert_node(NodeRecord::Phrase(PhraseNode {
                key: phrase.id.clone(),
                document_id: document_id.clone(),
                order: i64::from(phrase.order),
                segnum: phrase.segment_number.clone(),
                surface_text: phrase.surface_text.clone(),
                language: phrase.language.clone(),
            }));
            batch.upsert_edge(edge(
                REL_PHRASE_IN_SECTION,
                &section.id,
                &phrase.id,
                Some(i64::from(phrase.order)),
            ));
            languages.record(&phrase.id, phrase.language.as_ref());

            for (word_order, word) in (0_i64..).zip(&phrase.words) {
                batch.upsert_node(NodeRecord::Word(WordNode {
                    key: word.id.clone(),
                    document_id: document_id.clone(),
                    surface_form: word.surface_form.clone(),
                    gloss: word.gloss.clone(),
                    pos: word.part_of_speech.clone(),
                    language: word.language.clone(),
                    is_punctuation: word.is_punctuation,
                    guid: word.guid.clone(),
                    gloss_language: word.gloss_language.clone(),
                }));
                batch.upsert_edge(edge(
                    REL_PHRASE_COMPOSED_OF,
                    &phrase.id,
                    &word.id,
                    Some(word_order),
                ));
                batch.upsert_edge(edge(
                    REL_SECTION_HAS_WORD,
                    &section.id,
                    &word.id,
                    Some(section_word_index),
                ));
                section_word_index += 1;
                languages.record(&word.id, word.language.as_ref());

                for (morpheme_order, morpheme) in (0_i64..).zip(&word.morphemes) {
                    batch.upsert_node(NodeRecord::Morpheme(MorphemeNode {
                        key: morpheme.id.clone(),
                        document_id: document_id.clone(),
                        morph_type: morpheme.morph_type.as_str().to_string(),
                        surface_form: morpheme.surface_form.clone(),
                        citation_form: morpheme.citation_form.clone(),
                        gloss: morpheme.gloss.clone(),
                        msa: morpheme.msa.clone(),
                        language: morpheme.language.clone(),
                        guid: morpheme.guid.clone(),
                        gloss_language: morpheme.gloss_language.clone(),
                    }));
                    batch.upsert_edge(edge(
                        REL_WORD_MADE_OF,
                        &word.id,
                        &morpheme.id,
                        Some(morpheme_order),
                    ));
                    languages.record(&morpheme.id, morpheme.language.as_ref());
                }
            }
        }
    }

    for (gloss_order, gloss) in (0_i64..).zip(&document.glosses) {
        batch.upsert_node(NodeRecord::Gloss(GlossNode {
            key: gloss.id.clone(),
            document_id: document_id.clone(),
            kind: gloss.kind.as_str().to_string(),
            target_kind: gloss.target.kind.as_str().to_string(),
            text: gloss.text.clone(),
            language: gloss.language.clone(),
        }));
        batch.upsert_edge(edge(REL_ANALYZES, &gloss.id, &gloss.target.id, Some(gloss_order)));
        languages.record(&gloss.id, gloss.language.as_ref());
    }

    Materialized { batch, languages }
}
