//! Lexical analyses over document trees.
//!
//! Frequency tables for wordforms, morphemes and part-of-speech tags, a
//! consistency check that flags morphemes analysed in conflicting ways, and
//! allomorph groups (one citation form realised by several surface forms).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::{error::Error, fmt, str::FromStr};

use igt_store::tree::{Document, Morpheme};
use serde::{Deserialize, Serialize};

/// More than this many morpheme types for one citation form is a conflict.
const MAX_TYPES: usize = 1;
const MAX_MSAS: usize = 2;
const MAX_GLOSSES: usize = 3;

/// What a frequency table counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyItem {
    /// Surface forms of non-punctuation words.
    Word,
    /// Citation forms of morphemes.
    Morpheme,
    /// Part-of-speech tags of words.
    Pos,
}

impl FrequencyItem {
    pub const ALL: [Self; 3] = [Self::Word, Self::Morpheme, Self::Pos];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Morpheme => "morpheme",
            Self::Pos => "pos",
        }
    }
}

impl fmt::Display for FrequencyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFrequencyItem(pub String);

impl fmt::Display for UnknownFrequencyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown frequency item '{}', expected word, morpheme or pos", self.0)
    }
}

impl Error for UnknownFrequencyItem {}

impl FromStr for FrequencyItem {
    type Err = UnknownFrequencyItem;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|item| item.as_str() == normalized)
            .ok_or_else(|| UnknownFrequencyItem(value.to_string()))
    }
}

/// Parameters of a frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyQuery {
    pub item: FrequencyItem,
    /// Only count entities whose resolved language matches.
    pub language: Option<String>,
    pub min_frequency: usize,
    pub limit: usize,
}

impl FrequencyQuery {
    pub const DEFAULT_LIMIT: usize = 100;

    #[must_use]
    pub const fn new(item: FrequencyItem) -> Self {
        Self {
            item,
            language: None,
            min_frequency: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// One row of a frequency table.
///
/// `percentage` is the share of all counted occurrences, rounded to two
/// decimals, and is computed before `min_frequency` and `limit` apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub item: String,
    pub frequency: usize,
    pub percentage: f64,
}

/// Counts wordforms, morphemes or tags, most frequent first. Ties sort by item.
#[must_use]
pub fn frequency<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    query: &FrequencyQuery,
) -> Vec<FrequencyEntry> {
    let language = query.language.as_deref();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for word in documents.into_iter().flat_map(Document::words) {
        if word.is_punctuation {
            continue;
        }
        match query.item {
            FrequencyItem::Word if matches_language(word.language.as_deref(), language) => {
                if !word.surface_form.trim().is_empty() {
                    *counts.entry(word.surface_form.as_str()).or_default() += 1;
                }
            }
            FrequencyItem::Pos if matches_language(word.language.as_deref(), language) => {
                if let Some(pos) = word.part_of_speech.as_deref() {
                    *counts.entry(pos).or_default() += 1;
                }
            }
            FrequencyItem::Morpheme => {
                for morpheme in &word.morphemes {
                    if !matches_language(morpheme.language.as_deref(), language) {
                        continue;
                    }
                    if let Some(citation_form) = morpheme.citation_form.as_deref() {
                        *counts.entry(citation_form).or_default() += 1;
                    }
                }
            }
            FrequencyItem::Word | FrequencyItem::Pos => {}
        }
    }

    let total: usize = counts.values().sum();
    let mut entries: Vec<FrequencyEntry> = counts
        .into_iter()
        .filter(|(_, count)| *count >= query.min_frequency)
        .map(|(item, count)| FrequencyEntry {
            item: item.to_string(),
            frequency: count,
            percentage: share(count, total),
        })
        .collect();
    entries.sort_by(|left, right| {
        right
            .frequency
            .cmp(&left.frequency)
            .then_with(|| left.item.cmp(&right.item))
    });
    entries.truncate(query.limit);
    entries
}

/// Why a citation form was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Analysed with more than one morpheme type.
    TypeConflict,
    /// Carries more than two grammatical analyses.
    MsaConflict,
    /// Glossed more than three different ways.
    GlossVariance,
}

/// A citation form whose analyses disagree across the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphemeIssue {
    pub citation_form: String,
    pub language: Option<String>,
    pub instances: usize,
    pub types: BTreeSet<String>,
    pub msas: BTreeSet<String>,
    pub glosses: BTreeSet<String>,
    pub issue: IssueKind,
}

/// Flags citation forms with conflicting types, analyses or glosses.
///
/// When several problems apply the issue is the first of type conflict, msa
/// conflict and gloss variance. Most frequent forms come first.
#[must_use]
pub fn morpheme_issues<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    language: Option<&str>,
    limit: usize,
) -> Vec<MorphemeIssue> {
    let mut issues: Vec<MorphemeIssue> = group_by_citation_form(documents, language)
        .into_iter()
        .filter_map(|((citation_form, language), group)| {
            let types: BTreeSet<String> = group
                .iter()
                .map(|morpheme| morpheme.morph_type.as_str().to_string())
                .collect();
            let msas: BTreeSet<String> = group.iter().filter_map(|morpheme| morpheme.msa.clone()).collect();
            let glosses: BTreeSet<String> = group.iter().filter_map(|morpheme| morpheme.gloss.clone()).collect();
            let issue = if types.len() > MAX_TYPES {
                IssueKind::TypeConflict
            } else if msas.len() > MAX_MSAS {
                IssueKind::MsaConflict
            } else if glosses.len() > MAX_GLOSSES {
                IssueKind::GlossVariance
            } else {
                return None;
            };
            Some(MorphemeIssue {
                citation_form,
                language,
                instances: group.len(),
                types,
                msas,
                glosses,
                issue,
            })
        })
        .collect();
    issues.sort_by(|left, right| {
        right
            .instances
            .cmp(&left.instances)
            .then_with(|| right.types.len().cmp(&left.types.len()))
            .then_with(|| right.glosses.len().cmp(&left.glosses.len()))
            .then_with(|| left.citation_form.cmp(&right.citation_form))
    });
    issues.truncate(limit);
    issues
}

/// Surface variants sharing one citation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllomorphGroup {
    pub citation_form: String,
    pub language: Option<String>,
    pub surface_forms: BTreeSet<String>,
    pub glosses: BTreeSet<String>,
    pub instances: usize,
    pub morpheme_ids: Vec<String>,
}

/// Groups morphemes by citation form and keeps those realised by at least
/// `min_variants` distinct surface forms.
#[must_use]
pub fn allomorphs<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    language: Option<&str>,
    min_variants: usize,
    limit: usize,
) -> Vec<AllomorphGroup> {
    let mut groups: Vec<AllomorphGroup> = group_by_citation_form(documents, language)
        .into_iter()
        .filter_map(|((citation_form, language), group)| {
            let surface_forms: BTreeSet<String> = group
                .iter()
                .filter_map(|morpheme| {
                    let form = morpheme.surface_form.trim();
                    (!form.is_empty()).then(|| form.to_string())
                })
                .collect();
            if surface_forms.len() < min_variants {
                return None;
            }
            Some(AllomorphGroup {
                citation_form,
                language,
                surface_forms,
                glosses: group.iter().filter_map(|morpheme| morpheme.gloss.clone()).collect(),
                instances: group.len(),
                morpheme_ids: group.iter().map(|morpheme| morpheme.id.clone()).collect(),
            })
        })
        .collect();
    groups.sort_by(|left, right| {
        right
            .instances
            .cmp(&left.instances)
            .then_with(|| right.surface_forms.len().cmp(&left.surface_forms.len()))
            .then_with(|| left.citation_form.cmp(&right.citation_form))
    });
    groups.truncate(limit);
    groups
}

type CitationKey = (String, Option<String>);

// Morphemes with a citation form, keyed by form and resolved language.
fn group_by_citation_form<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    language: Option<&str>,
) -> BTreeMap<CitationKey, Vec<&'a Morpheme>> {
    let mut groups: BTreeMap<CitationKey, Vec<&'a Morpheme>> = BTreeMap::new();
    let morphemes = documents
        .into_iter()
        .flat_map(Document::words)
        .flat_map(|word| word.morphemes.iter());
    for morpheme in morphemes {
        let Some(citation_form) = morpheme.citation_form.as_deref() else {
            continue;
        };
        if !matches_language(morpheme.language.as_deref(), language) {
            continue;
        }
        groups
            .entry((citation_form.to_string(), morpheme.language.clone()))
            .or_default()
            .push(morpheme);
    }
    groups
}

fn matches_language(value: Option<&str>, wanted: Option<&str>) -> bool {
    wanted.is_none_or(|wanted| value == Some(wanted))
}

fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = f64::from(saturate(count)) * 100.0 / f64::from(saturate(total));
    (percent * 100.0).round() / 100.0
}

fn saturate(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
