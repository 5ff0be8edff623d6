use std::collections::{BTreeMap, BTreeSet};

use igt_store::models::{
    GlossNode,
    MorphemeNode,
    PhraseNode,
    RelationRecord,
    SectionNode,
    Subgraph,
    TextNode,
    WordNode,
};
use igt_store::schema::{
    REL_ANALYZES,
    REL_PHRASE_COMPOSED_OF,
    REL_PHRASE_IN_SECTION,
    REL_SECTION_PART_OF_TEXT,
    REL_WORD_MADE_OF,
};
use igt_store::tree::TargetKind;

use super::GraphWarning;

/// A gloss row joined with the key of the node it analyzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossRecord {
    pub node: GlossNode,
    pub target_key: String,
}

/// Rows of one stored document, grouped by parent key and ordered per level.
#[derive(Debug, Clone)]
pub struct DocumentRecords {
    pub text: TextNode,
    pub sections: Vec<SectionNode>,
    phrases: BTreeMap<String, Vec<PhraseNode>>,
    words: BTreeMap<String, Vec<WordNode>>,
    morphemes: BTreeMap<String, Vec<MorphemeNode>>,
    pub glosses: Vec<GlossRecord>,
    pub warnings: Vec<GraphWarning>,
}

impl DocumentRecords {
    /// Joins node rows with their parent relations.
    ///
    /// Sections and phrases are ordered by their own `order`, words, morphemes
    /// and glosses by the order on the attaching relation; ties break on key.
    /// Rows without a parent relation and relations pointing at missing rows
    /// are dropped with a warning. `section_has_word` is never consulted.
    #[must_use]
    pub fn from_subgraph(subgraph: Subgraph) -> Self {
        let Subgraph {
            text,
            sections,
            phrases,
            words,
            morphemes,
            glosses,
            relations,
        } = subgraph;
        let mut warnings = Vec::new();

        let roots = BTreeSet::from([text.key.clone()]);
        let (mut sections, section_keys) = attach(
            REL_SECTION_PART_OF_TEXT,
            by_key(sections, |row| &row.key),
            &relations,
            &roots,
            |row, _| row.order,
            &mut warnings,
        );
        let sections = sections.remove(&text.key).unwrap_or_default();

        let (phrases, phrase_keys) = attach(
            REL_PHRASE_IN_SECTION,
            by_key(phrases, |row| &row.key),
            &relations,
            &section_keys,
            |row, _| row.order,
            &mut warnings,
        );
        let (words, word_keys) = attach(
            REL_PHRASE_COMPOSED_OF,
            by_key(words, |row| &row.key),
            &relations,
            &phrase_keys,
            |_, relation| relation_order(relation),
            &mut warnings,
        );
        let (morphemes, morpheme_keys) = attach(
            REL_WORD_MADE_OF,
            by_key(morphemes, |row| &row.key),
            &relations,
            &word_keys,
            |_, relation| relation_order(relation),
            &mut warnings,
        );

        let mut glosses = by_key(glosses, |row| &row.key);
        let mut attached = Vec::new();
        for relation in relations.iter().filter(|relation| relation.kind == REL_ANALYZES) {
            let Some(node) = glosses.remove(&relation.from_key) else {
                warnings.push(GraphWarning::new(
                    &relation.from_key,
                    "analyzes relation starts at a missing gloss",
                ));
                continue;
            };
            let target_exists = match TargetKind::parse(&node.target_kind) {
                Some(TargetKind::Phrase) => phrase_keys.contains(&relation.to_key),
                Some(TargetKind::Word) => word_keys.contains(&relation.to_key),
                Some(TargetKind::Morpheme) => morpheme_keys.contains(&relation.to_key),
                None => false,
            };
            if !target_exists {
                warnings.push(GraphWarning::new(
                    &node.key,
                    format!(
                        "gloss target {} '{}' is not part of the document",
                        node.target_kind, relation.to_key
                    ),
                ));
                continue;
            }
            attached.push((relation_order(relation), node.key.clone(), GlossRecord {
                node,
                target_key: relation.to_key.clone(),
            }));
        }
        for key in glosses.into_keys() {
            warnings.push(GraphWarning::new(key, "gloss has no analyzes relation"));
        }
        attached.sort_by(|left, right| (left.0, &left.1).cmp(&(right.0, &right.1)));
        let glosses = attached.into_iter().map(|(_, _, record)| record).collect();

        Self {
            text,
            sections,
            phrases,
            words,
            morphemes,
            glosses,
            warnings,
        }
    }

    #[must_use]
    pub fn phrases_of(&self, section_key: &str) -> &[PhraseNode] {
        self.phrases.get(section_key).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn words_of(&self, phrase_key: &str) -> &[WordNode] {
        self.words.get(phrase_key).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn morphemes_of(&self, word_key: &str) -> &[MorphemeNode] {
        self.morphemes.get(word_key).map(Vec::as_slice).unwrap_or_default()
    }
}

fn by_key<T>(rows: Vec<T>, key: impl Fn(&T) -> &String) -> BTreeMap<String, T> {
    rows.into_iter().map(|row| (key(&row).clone(), row)).collect()
}

fn relation_order(relation: &RelationRecord) -> i64 {
    relation.order.unwrap_or(i64::MAX)
}

type Attached<T> = (BTreeMap<String, Vec<T>>, BTreeSet<String>);

fn attach<T>(
    kind: &str,
    mut nodes: BTreeMap<String, T>,
    relations: &[RelationRecord],
    parents: &BTreeSet<String>,
    order_of: impl Fn(&T, &RelationRecord) -> i64,
    warnings: &mut Vec<GraphWarning>,
) -> Attached<T> {
    let mut grouped: BTreeMap<String, Vec<(i64, String, T)>> = BTreeMap::new();
    for relation in relations.iter().filter(|relation| relation.kind == kind) {
        if !parents.contains(&relation.from_key) {
            continue;
        }
        let Some(node) = nodes.remove(&relation.to_key) else {
            warnings.push(GraphWarning::new(
                &relation.to_key,
                format!("{kind} relation target is missing or already attached"),
            ));
            continue;
        };
        let order = order_of(&node, relation);
        grouped
            .entry(relation.from_key.clone())
            .or_default()
            .push((order, relation.to_key.clone(), node));
    }
    for key in nodes.into_keys() {
        warnings.push(GraphWarning::new(
            key,
            format!("row has no {kind} relation from a stored parent"),
        ));
    }

    let mut keys = BTreeSet::new();
    let groups = grouped
        .into_iter()
        .map(|(parent, mut children)| {
            children.sort_by(|left, right| (left.0, &left.1).cmp(&(right.0, &right.1)));
            let rows = children
                .into_iter()
                .map(|(_, key, row)| {
                    keys.insert(key);
                    row
                })
                .collect();
            (parent, rows)
        })
        .collect();
    (groups, keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text() -> TextNode {
        TextNode {
            key: "t".to_string(),
            document_id: "t".to_string(),
            title: None,
            source: None,
            comment: None,
            language_code: None,
        }
    }

    fn section(key: &str, order: i64) -> SectionNode {
        SectionNode {
            key: key.to_string(),
            document_id: "t".to_string(),
            order,
        }
    }

    fn relation(kind: &str, from: &str, to: &str, order: Option<i64>) -> RelationRecord {
        RelationRecord {
            kind: kind.to_string(),
            from_key: from.to_string(),
            to_key: to.to_string(),
            document_id: "t".to_string(),
            order,
        }
    }

    fn word(key: &str) -> WordNode {
        WordNode {
            key: key.to_string(),
            document_id: "t".to_string(),
            surface_form: key.to_string(),
            gloss: None,
            pos: None,
            language: None,
            is_punctuation: false,
            guid: None,
            gloss_language: None,
        }
    }

    fn empty_subgraph() -> Subgraph {
        Subgraph {
            text: text(),
            sections: Vec::new(),
            phrases: Vec::new(),
            words: Vec::new(),
            morphemes: Vec::new(),
            glosses: Vec::new(),
            relations: Vec::new(),
        }
    }

    #[test]
    fn sections_sort_by_order_then_key() {
        let mut subgraph = empty_subgraph();
        subgraph.sections = vec![section("b", 1), section("c", 0), section("a", 1)];
        subgraph.relations = vec![
            relation(REL_SECTION_PART_OF_TEXT, "t", "b", None),
            relation(REL_SECTION_PART_OF_TEXT, "t", "c", None),
            relation(REL_SECTION_PART_OF_TEXT, "t", "a", None),
        ];
        let records = DocumentRecords::from_subgraph(subgraph);
        let keys: Vec<_> = records.sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
        assert!(records.warnings.is_empty());
    }

    #[test]
    fn words_sort_by_relation_order() {
        let mut subgraph = empty_subgraph();
        subgraph.sections = vec![section("s", 0)];
        subgraph.phrases = vec![PhraseNode {
            key: "p".to_string(),
            document_id: "t".to_string(),
            order: 0,
            segnum: None,
            surface_text: None,
            language: None,
        }];
        subgraph.words = vec![word("w1"), word("w2")];
        subgraph.relations = vec![
            relation(REL_SECTION_PART_OF_TEXT, "t", "s", Some(0)),
            relation(REL_PHRASE_IN_SECTION, "s", "p", Some(0)),
            relation(REL_PHRASE_COMPOSED_OF, "p", "w1", Some(1)),
            relation(REL_PHRASE_COMPOSED_OF, "p", "w2", Some(0)),
        ];
        let records = DocumentRecords::from_subgraph(subgraph);
        let keys: Vec<_> = records.words_of("p").iter().map(|w| w.key.as_str()).collect();
        assert_eq!(keys, vec!["w2", "w1"]);
    }

    #[test]
    fn orphans_and_dangling_relations_are_reported() {
        let mut subgraph = empty_subgraph();
        subgraph.sections = vec![section("s", 0), section("lost", 1)];
        subgraph.relations = vec![
            relation(REL_SECTION_PART_OF_TEXT, "t", "s", Some(0)),
            relation(REL_SECTION_PART_OF_TEXT, "t", "ghost", Some(1)),
        ];
        let records = DocumentRecords::from_subgraph(subgraph);
        assert_eq!(records.sections.len(), 1);
        let flagged: Vec<_> = records.warnings.iter().map(|w| w.entity_id.as_str()).collect();
        assert_eq!(flagged, vec!["ghost", "lost"]);
    }

    #[test]
    fn glosses_on_missing_targets_are_dropped() {
        let mut subgraph = empty_subgraph();
        subgraph.glosses = vec![GlossNode {
            key: "g".to_string(),
            document_id: "t".to_string(),
            kind: "free".to_string(),
            target_kind: "word".to_string(),
            text: "hello".to_string(),
            language: None,
        }];
        subgraph.relations = vec![relation(REL_ANALYZES, "g", "nowhere", Some(0))];
        let records = DocumentRecords::from_subgraph(subgraph);
        assert!(records.glosses.is_empty());
        assert_eq!(records.warnings.len(), 1);
        assert_eq!(records.warnings[0].entity_id, "g");
    }

    #[test]
    fn empty_document_has_no_levels() {
        let records = DocumentRecords::from_subgraph(empty_subgraph());
        assert!(records.sections.is_empty());
        assert!(records.phrases_of("anything").is_empty());
        assert!(records.warnings.is_empty());
    }
}
