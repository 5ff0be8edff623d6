//! Corpus coverage and annotation metrics.

use std::collections::{BTreeMap, BTreeSet};

use igt_store::tree::Document;
use serde::{Deserialize, Serialize};

/// Metrics over one or more documents.
///
/// Every non-punctuation word falls in exactly one of `words_with_morphemes`,
/// `words_with_only_translation` or `words_whitespace_only`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_texts: usize,
    pub annotated_texts: usize,
    pub total_sections: usize,
    pub total_phrases: usize,
    pub total_words: usize,
    pub total_morphemes: usize,
    pub punctuation_words: usize,
    pub words_with_morphemes: usize,
    pub words_with_only_translation: usize,
    pub words_whitespace_only: usize,
    pub total_glosses: usize,
    pub languages: BTreeSet<String>,
    pub pos_tags: BTreeSet<String>,
    pub morpheme_types: BTreeMap<String, usize>,
}

impl CorpusStats {
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        let mut stats = Self {
            total_texts: 1,
            total_sections: document.sections.len(),
            total_glosses: document.glosses.len(),
            ..Self::default()
        };
        stats.languages.extend(document.default_language.iter().cloned());
        stats
            .languages
            .extend(document.glosses.iter().filter_map(|gloss| gloss.language.clone()));

        let mut annotated = false;
        for phrase in document.sections.iter().flat_map(|section| &section.phrases) {
            stats.total_phrases += 1;
            stats.languages.extend(phrase.language.iter().cloned());

            for word in &phrase.words {
                stats.total_words += 1;
                stats.languages.extend(word.language.iter().cloned());
                if word.is_punctuation {
                    stats.punctuation_words += 1;
                    continue;
                }
                stats.pos_tags.extend(word.part_of_speech.iter().cloned());
                annotated |= word.gloss.is_some() || word.has_morphemes();

                if word.has_morphemes() {
                    stats.words_with_morphemes += 1;
                } else if word.gloss.is_some() {
                    stats.words_with_only_translation += 1;
                } else {
                    stats.words_whitespace_only += 1;
                }

                for morpheme in &word.morphemes {
                    stats.total_morphemes += 1;
                    stats.languages.extend(morpheme.language.iter().cloned());
                    *stats
                        .morpheme_types
                        .entry(morpheme.morph_type.as_str().to_string())
                        .or_default() += 1;
                }
            }
        }

        if annotated {
            stats.annotated_texts = 1;
        }
        stats
    }

    /// Combines two records. Associative and commutative, with
    /// `CorpusStats::default()` as identity.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.total_texts += other.total_texts;
        self.annotated_texts += other.annotated_texts;
        self.total_sections += other.total_sections;
        self.total_phrases += other.total_phrases;
        self.total_words += other.total_words;
        self.total_morphemes += other.total_morphemes;
        self.punctuation_words += other.punctuation_words;
        self.words_with_morphemes += other.words_with_morphemes;
        self.words_with_only_translation += other.words_with_only_translation;
        self.words_whitespace_only += other.words_whitespace_only;
        self.total_glosses += other.total_glosses;
        self.languages.extend(other.languages);
        self.pos_tags.extend(other.pos_tags);
        for (morph_type, count) in other.morpheme_types {
            *self.morpheme_types.entry(morph_type).or_default() += count;
        }
        self
    }

    pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
        documents
            .into_iter()
            .map(Self::from_document)
            .fold(Self::default(), Self::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{FlextextParser, ParseOptions};

    fn parse(xml: &str) -> Vec<Document> {
        FlextextParser::parse(xml, &ParseOptions::new())
            .expect("fixture should parse")
            .documents
    }

    const KANI: &str = r#"<interlinear-text guid="a">
  <item type="title" lang="en">Kani</item>
  <paragraphs><paragraph><phrases><phrase>
    <item type="segnum">1</item><item type="txt">kani</item>
    <words><word><item type="txt">kani</item>
      <morphemes>
        <morph type="prefix"><item type="txt">ka</item><item type="gls">1sg</item></morph>
        <morph type="stem"><item type="txt">ni</item></morph>
      </morphemes>
    </word></words>
  </phrase></phrases></paragraph></paragraphs>
</interlinear-text>"#;

    const MIXED: &str = r#"<interlinear-text guid="b">
  <paragraphs><paragraph><phrases><phrase>
    <item type="txt" lang="fr">oui non .</item>
    <item type="gls" lang="en">yes no</item>
    <words>
      <word><item type="txt">oui</item><item type="gls">yes</item><item type="pos">adv</item></word>
      <word><item type="txt">non</item></word>
      <word><item type="punct">.</item></word>
    </words>
  </phrase></phrases></paragraph></paragraphs>
</interlinear-text>"#;

    const EMPTY: &str = r#"<interlinear-text guid="c"><item type="title">Nothing</item></interlinear-text>"#;

    #[test]
    fn counts_a_single_analyzed_word() {
        let stats = CorpusStats::from_documents(&parse(KANI));
        assert_eq!(stats.total_texts, 1);
        assert_eq!(stats.annotated_texts, 1);
        assert_eq!(stats.total_words, 1);
        assert_eq!(stats.total_morphemes, 2);
        assert_eq!(stats.words_with_morphemes, 1);
        assert_eq!(stats.morpheme_types.get("prefix"), Some(&1));
        assert_eq!(stats.morpheme_types.get("stem"), Some(&1));
    }

    #[test]
    fn buckets_partition_non_punctuation_words() {
        let stats = CorpusStats::from_documents(&parse(MIXED));
        assert_eq!(stats.total_words, 3);
        assert_eq!(stats.punctuation_words, 1);
        assert_eq!(stats.words_with_only_translation, 1);
        assert_eq!(stats.words_whitespace_only, 1);
        assert_eq!(stats.words_with_morphemes, 0);
        assert_eq!(
            stats.words_with_morphemes + stats.words_with_only_translation + stats.words_whitespace_only,
            stats.total_words - stats.punctuation_words
        );
        assert_eq!(stats.total_glosses, 1);
        assert_eq!(stats.pos_tags.iter().collect::<Vec<_>>(), vec!["adv"]);
        assert_eq!(stats.languages.iter().collect::<Vec<_>>(), vec!["en", "fr"]);
    }

    #[test]
    fn empty_document_is_not_annotated() {
        let stats = CorpusStats::from_documents(&parse(EMPTY));
        assert_eq!(stats.total_texts, 1);
        assert_eq!(stats.annotated_texts, 0);
        assert_eq!(stats.total_words, 0);
    }

    #[test]
    fn merge_is_associative_and_commutative() {
        let a = CorpusStats::from_documents(&parse(KANI));
        let b = CorpusStats::from_documents(&parse(MIXED));
        let c = CorpusStats::from_documents(&parse(EMPTY));

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.clone().merge(b.clone().merge(c.clone()));
        assert_eq!(left, right);
        assert_eq!(a.clone().merge(b.clone()), b.merge(a.clone()));
        assert_eq!(a.clone().merge(CorpusStats::default()), a);
        assert_eq!(left.total_texts, 3);
        assert_eq!(left.annotated_texts, 2);
    }

    #[test]
    fn serializes_languages_as_sorted_list() {
        let stats = CorpusStats::from_documents(&parse(MIXED));
        let json = serde_json::to_value(&stats).expect("stats should serialize");
        assert_eq!(json["languages"], serde_json::json!(["en", "fr"]));
        assert_eq!(json["total_words"], serde_json::json!(3));
    }
}
