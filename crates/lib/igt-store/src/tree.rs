use std::{collections::HashSet, error::Error, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// One interlinear text with its sections and free-standing glosses.
///
/// Languages on phrases, words and morphemes are stored resolved: an entity
/// without its own language tag carries the language of its enclosing scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glosses: Vec<Gloss>,
}

/// Paragraph-level grouping of phrases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub id: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phrases: Vec<Phrase>,
}

/// A sentence or utterance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Phrase {
    pub id: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<Word>,
}

/// A word or punctuation token. Position in `Phrase::words` is its order.
///
/// `id` identifies this occurrence. `guid` keeps the identifier the source
/// file gave the token, which FLEx repeats for every occurrence of the same
/// wordform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Word {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    pub surface_form: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloss_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub is_punctuation: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub morphemes: Vec<Morpheme>,
}

impl Word {
    /// Builds a punctuation token; it never carries morphemes, gloss or part of speech.
    #[must_use]
    pub fn punctuation(
        id: impl Into<String>,
        literal: impl Into<String>,
        language: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            guid: None,
            surface_form: literal.into(),
            gloss: None,
            gloss_language: None,
            part_of_speech: None,
            language,
            is_punctuation: true,
            morphemes: Vec::new(),
        }
    }

    #[must_use]
    pub const fn has_morphemes(&self) -> bool {
        !self.morphemes.is_empty()
    }
}

/// A morphological unit. Position in `Word::morphemes` is its order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Morpheme {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(rename = "type", default)]
    pub morph_type: MorphemeType,
    pub surface_form: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gloss_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MorphemeType {
    #[default]
    Stem,
    Prefix,
    Suffix,
    Infix,
    Circumfix,
    Root,
}

impl MorphemeType {
    pub const ALL: [Self; 6] = [
        Self::Stem,
        Self::Prefix,
        Self::Suffix,
        Self::Infix,
        Self::Circumfix,
        Self::Root,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stem => "stem",
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Infix => "infix",
            Self::Circumfix => "circumfix",
            Self::Root => "root",
        }
    }
}

impl fmt::Display for MorphemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a morpheme type string is outside the known set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMorphemeType(pub String);

impl fmt::Display for UnknownMorphemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown morpheme type '{}'", self.0)
    }
}

impl Error for UnknownMorphemeType {}

impl FromStr for MorphemeType {
    type Err = UnknownMorphemeType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| UnknownMorphemeType(value.to_string()))
    }
}

/// Free-standing annotation attached to a phrase, word or morpheme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gloss {
    pub id: String,
    pub target: GlossTarget,
    pub kind: GlossKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GlossTarget {
    pub kind: TargetKind,
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Phrase,
    Word,
    Morpheme,
}

impl TargetKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phrase => "phrase",
            Self::Word => "word",
            Self::Morpheme => "morpheme",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "phrase" => Some(Self::Phrase),
            "word" => Some(Self::Word),
            "morpheme" => Some(Self::Morpheme),
            _ => None,
        }
    }
}

/// Kind of annotation, mirroring the document-format item type it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlossKind {
    Free,
    Literal,
    Note,
}

impl GlossKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Literal => "literal",
            Self::Note => "note",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "free" => Some(Self::Free),
            "literal" => Some(Self::Literal),
            "note" => Some(Self::Note),
            _ => None,
        }
    }

    #[must_use]
    pub const fn item_type(self) -> &'static str {
        match self {
            Self::Free => "gls",
            Self::Literal => "lit",
            Self::Note => "note",
        }
    }

    #[must_use]
    pub fn from_item_type(value: &str) -> Option<Self> {
        match value {
            "gls" => Some(Self::Free),
            "lit" => Some(Self::Literal),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

impl Document {
    /// Iterates every word of the document in section, phrase, word order.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.sections
            .iter()
            .flat_map(|section| section.phrases.iter())
            .flat_map(|phrase| phrase.words.iter())
    }

    /// Glosses attached to `target_id`, in side-list order.
    pub fn glosses_for<'a>(&'a self, target_id: &'a str) -> impl Iterator<Item = &'a Gloss> {
        self.glosses
            .iter()
            .filter(move |gloss| gloss.target.id == target_id)
    }

    /// Lists structural invariant violations; an empty list means the tree is valid.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut seen = HashSet::new();
        let mut punctuation = HashSet::new();
        seen.insert(self.id.as_str());
        for (index, section) in self.sections.iter().enumerate() {
            if !seen.insert(section.id.as_str()) {
                violations.push(format!("id {} is used more than once", section.id));
            }
            if usize::try_from(section.order).ok() != Some(index) {
                violations.push(format!(
                    "section {} has order {} at position {index}",
                    section.id, section.order
                ));
            }
            for (index, phrase) in section.phrases.iter().enumerate() {
                if usize::try_from(phrase.order).ok() != Some(index) {
                    violations.push(format!(
                        "phrase {} has order {} at position {index}",
                        phrase.id, phrase.order
                    ));
                }
                if !seen.insert(phrase.id.as_str()) {
                    violations.push(format!("id {} is used more than once", phrase.id));
                }
                for word in &phrase.words {
                    if !seen.insert(word.id.as_str()) {
                        violations.push(format!("id {} is used more than once", word.id));
                    }
                    for morpheme in &word.morphemes {
                        if !seen.insert(morpheme.id.as_str()) {
                            violations.push(format!("id {} is used more than once", morpheme.id));
                        }
                    }
                    if word.is_punctuation {
                        punctuation.insert(word.id.as_str());
                    }
                    if word.is_punctuation && word.has_morphemes() {
                        violations.push(format!(
                            "punctuation word {} carries morphemes",
                            word.id
                        ));
                    }
                    if word.is_punctuation && (word.gloss.is_some() || word.part_of_speech.is_some()) {
                        violations.push(format!(
                            "punctuation word {} carries analysis fields",
                            word.id
                        ));
                    }
                }
            }
        }
        for gloss in &self.glosses {
            if gloss.text.trim().is_empty() {
                violations.push(format!("gloss {} is empty", gloss.id));
            }
            if gloss.target.kind == TargetKind::Word && punctuation.contains(gloss.target.id.as_str()) {
                violations.push(format!(
                    "gloss {} annotates punctuation word {}",
                    gloss.id, gloss.target.id
                ));
            }
        }
        violations
    }
}

/// Returns the value as an owned string, or `None` when it is empty or whitespace.
#[must_use]
pub fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
