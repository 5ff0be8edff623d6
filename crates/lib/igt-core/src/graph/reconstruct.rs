use std::collections::HashSet;

use igt_store::models::{MorphemeNode, WordNode};
use igt_store::tree::{
    Document,
    Gloss,
    GlossKind,
    GlossTarget,
    Morpheme,
    MorphemeType,
    Phrase,
    Section,
    TargetKind,
    Word,
    non_empty,
};

use super::{DocumentRecords, GraphWarning};

/// A rebuilt document tree plus whatever was skipped on the way.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub document: Document,
    pub warnings: Vec<GraphWarning>,
}

/// Rebuilds the document tree from ordered records.
///
/// Orders are renumbered from zero. Languages missing on a row are taken from
/// the enclosing scope, and the stored punctuation flag is trusted: glosses
/// aimed at a punctuation word are dropped with a warning.
#[must_use]
pub fn reconstruct(records: DocumentRecords) -> Reconstruction {
    let mut warnings = records.warnings.clone();
    let text = &records.text;
    let default_language = clean(text.language_code.as_ref());
    let mut present = HashSet::new();
    let mut punctuation = HashSet::new();

    let sections = records
        .sections
        .iter()
        .zip(0_u32..)
        .map(|(section_row, section_order)| {
            let phrases = records
                .phrases_of(&section_row.key)
                .iter()
                .zip(0_u32..)
                .map(|(phrase_row, phrase_order)| {
                    let language = clean(phrase_row.language.as_ref()).or_else(|| default_language.clone());
                    let words = records
                        .words_of(&phrase_row.key)
                        .iter()
                        .map(|word_row| {
                            let word = rebuild_word(&records, word_row, language.as_ref(), &mut warnings);
                            if word.is_punctuation {
                                punctuation.insert(word.id.clone());
                            } else {
                                present.insert((TargetKind::Word, word.id.clone()));
                            }
                            for morpheme in &word.morphemes {
                                present.insert((TargetKind::Morpheme, morpheme.id.clone()));
                            }
                            word
                        })
                        .collect();
                    present.insert((TargetKind::Phrase, phrase_row.key.clone()));
                    Phrase {
                        id: phrase_row.key.clone(),
                        order: phrase_order,
                        segment_number: clean(phrase_row.segnum.as_ref()),
                        surface_text: clean(phrase_row.surface_text.as_ref()),
                        language,
                        words,
                    }
                })
                .collect();
            Section {
                id: section_row.key.clone(),
                order: section_order,
                phrases,
            }
        })
        .collect();

    let mut glosses = Vec::with_capacity(records.glosses.len());
    for record in &records.glosses {
        let node = &record.node;
        let Some(target_kind) = TargetKind::parse(&node.target_kind) else {
            warnings.push(GraphWarning::new(
                &node.key,
                format!("unknown gloss target kind '{}'", node.target_kind),
            ));
            continue;
        };
        if target_kind == TargetKind::Word && punctuation.contains(&record.target_key) {
            warnings.push(GraphWarning::new(
                &node.key,
                "gloss targets a punctuation word, dropping it",
            ));
            continue;
        }
        if !present.contains(&(target_kind, record.target_key.clone())) {
            warnings.push(GraphWarning::new(
                &node.key,
                "gloss target is not reachable from the document",
            ));
            continue;
        }
        let Some(text) = non_empty(&node.text) else {
            warnings.push(GraphWarning::new(&node.key, "gloss text is empty"));
            continue;
        };
        let kind = GlossKind::parse(&node.kind).unwrap_or_else(|| {
            warnings.push(GraphWarning::new(
                &node.key,
                format!("unknown gloss kind '{}', using 'free'", node.kind),
            ));
            GlossKind::Free
        });
        glosses.push(Gloss {
            id: node.key.clone(),
            target: GlossTarget {
                kind: target_kind,
                id: record.target_key.clone(),
            },
            kind,
            text,
            language: clean(node.language.as_ref()),
        });
    }

    Reconstruction {
        document: Document {
            id: text.key.clone(),
            title: clean(text.title.as_ref()),
            source: clean(text.source.as_ref()),
            comment: clean(text.comment.as_ref()),
            default_language,
            sections,
            glosses,
        },
        warnings,
    }
}

fn rebuild_word(
    records: &DocumentRecords,
    row: &WordNode,
    phrase_language: Option<&String>,
    warnings: &mut Vec<GraphWarning>,
) -> Word {
    let language = clean(row.language.as_ref()).or_else(|| phrase_language.cloned());
    let morpheme_rows = records.morphemes_of(&row.key);

    if row.is_punctuation {
        if !morpheme_rows.is_empty() {
            warnings.push(GraphWarning::new(
                &row.key,
                "punctuation word has morphemes, dropping them",
            ));
        }
        return Word {
            guid: clean(row.guid.as_ref()),
            ..Word::punctuation(row.key.clone(), row.surface_form.clone(), language)
        };
    }

    let morphemes = morpheme_rows
        .iter()
        .map(|morpheme_row| rebuild_morpheme(morpheme_row, language.as_ref(), warnings))
        .collect();

    Word {
        id: row.key.clone(),
        guid: clean(row.guid.as_ref()),
        surface_form: row.surface_form.clone(),
        gloss: clean(row.gloss.as_ref()),
        gloss_language: clean(row.gloss_language.as_ref()),
        part_of_speech: clean(row.pos.as_ref()),
        language,
        is_punctuation: false,
        morphemes,
    }
}

fn rebuild_morpheme(
    row: &MorphemeNode,
    word_language: Option<&String>,
    warnings: &mut Vec<GraphWarning>,
) -> Morpheme {
    let morph_type = row.morph_type.parse().unwrap_or_else(|_| {
        warnings.push(GraphWarning::new(
            &row.key,
            format!("unknown morpheme type '{}', using '{}'", row.morph_type, MorphemeType::Stem),
        ));
        MorphemeType::Stem
    });
    Morpheme {
        id: row.key.clone(),
        guid: clean(row.guid.as_ref()),
        morph_type,
        surface_form: row.surface_form.clone(),
        citation_form: clean(row.citation_form.as_ref()),
        gloss: clean(row.gloss.as_ref()),
        gloss_language: clean(row.gloss_language.as_ref()),
        msa: clean(row.msa.as_ref()),
        language: clean(row.language.as_ref()).or_else(|| word_language.cloned()),
    }
}

fn clean(value: Option<&String>) -> Option<String> {
    value.and_then(|value| non_empty(value))
}
