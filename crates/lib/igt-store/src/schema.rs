use uuid::Uuid;

pub const TABLE_TEXT: &str = "text";
pub const TABLE_SECTION: &str = "section";
pub const TABLE_PHRASE: &str = "phrase";
pub const TABLE_WORD: &str = "word";
pub const TABLE_MORPHEME: &str = "morpheme";
pub const TABLE_GLOSS: &str = "gloss";

pub const REL_SECTION_PART_OF_TEXT: &str = "section_part_of_text";
pub const REL_PHRASE_IN_SECTION: &str = "phrase_in_section";
pub const REL_SECTION_HAS_WORD: &str = "section_has_word";
pub const REL_PHRASE_COMPOSED_OF: &str = "phrase_composed_of";
pub const REL_WORD_MADE_OF: &str = "word_made_of";
pub const REL_ANALYZES: &str = "analyzes";

pub const NODE_TABLES: [&str; 6] = [
    TABLE_TEXT,
    TABLE_SECTION,
    TABLE_PHRASE,
    TABLE_WORD,
    TABLE_MORPHEME,
    TABLE_GLOSS,
];

pub const RELATION_TABLES: [&str; 6] = [
    REL_SECTION_PART_OF_TEXT,
    REL_PHRASE_IN_SECTION,
    REL_SECTION_HAS_WORD,
    REL_PHRASE_COMPOSED_OF,
    REL_WORD_MADE_OF,
    REL_ANALYZES,
];

pub const SOURCE_KIND_FLEXTEXT: &str = "flextext";

pub const KIND_DOCUMENT: &str = "interlinear-text";
pub const KIND_SECTION: &str = "paragraph";
pub const KIND_PHRASE: &str = "phrase";
pub const KIND_WORD: &str = "word";
pub const KIND_MORPHEME: &str = "morph";
pub const KIND_GLOSS: &str = "gloss";

const ID_NAMESPACE: Uuid = Uuid::from_u128(0x1111_1111_1111_1111_1111_1111_1111_1111);

/// Derives an identifier for an entity that carried none in its source.
///
/// The result depends only on the parent identifier, the entity kind and the
/// entity's position under that parent, so re-importing an unchanged file
/// reproduces the same identifiers.
#[must_use]
pub fn synthesize_id(parent_id: &str, kind: &str, index: usize) -> String {
    let name = format!("{parent_id}|{kind}|{index}");
    Uuid::new_v5(&ID_NAMESPACE, name.as_bytes()).to_string()
}
