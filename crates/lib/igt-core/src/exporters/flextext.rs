use std::borrow::Cow;
use std::collections::HashMap;

use igt_store::tree::{Document, Gloss, Morpheme, Phrase, Section, Word};

const INDENT: &str = "  ";

/// Serializes document trees to FLEx `.flextext` XML.
///
/// Output is deterministic: children appear in order and absent values are
/// omitted. Texts, paragraphs and phrases carry their id as `guid`; words and
/// morphemes carry the `guid` they were read with, if any, since their ids are
/// per occurrence. `lang` appears only where a language differs from the one
/// inherited from the enclosing scope.
pub struct FlextextWriter;

impl FlextextWriter {
    #[must_use]
    pub fn write_document(document: &Document) -> String {
        Self::write_corpus(std::slice::from_ref(document))
    }

    #[must_use]
    pub fn write_corpus(documents: &[Document]) -> String {
        let mut out = XmlOut::default();
        out.line("<?xml version=\"1.0\" encoding=\"utf-8\"?>");
        if documents.is_empty() {
            out.line("<document version=\"2\"/>");
            return out.buf;
        }
        out.open("document", &[("version", "2")]);
        for document in documents {
            write_text(&mut out, document);
        }
        out.close("document");
        out.buf
    }
}

type GlossIndex<'a> = HashMap<&'a str, Vec<&'a Gloss>>;

fn write_text(out: &mut XmlOut, document: &Document) {
    let mut glosses: GlossIndex<'_> = HashMap::new();
    for gloss in &document.glosses {
        glosses.entry(gloss.target.id.as_str()).or_default().push(gloss);
    }

    out.open("interlinear-text", &[("guid", document.id.as_str())]);
    if document.title.is_some() || document.default_language.is_some() {
        out.item("title", document.default_language.as_deref(), document.title.as_deref());
    }
    if let Some(source) = document.source.as_deref() {
        out.item("source", None, Some(source));
    }
    if let Some(comment) = document.comment.as_deref() {
        out.item("comment", None, Some(comment));
    }
    if !document.sections.is_empty() {
        out.open("paragraphs", &[]);
        for section in &document.sections {
            write_section(out, section, document.default_language.as_deref(), &glosses);
        }
        out.close("paragraphs");
    }
    out.close("interlinear-text");
}

fn write_section(out: &mut XmlOut, section: &Section, inherited: Option<&str>, glosses: &GlossIndex<'_>) {
    if section.phrases.is_empty() {
        out.empty("paragraph", &[("guid", section.id.as_str())]);
        return;
    }
    out.open("paragraph", &[("guid", section.id.as_str())]);
    out.open("phrases", &[]);
    for phrase in &section.phrases {
        write_phrase(out, phrase, inherited, glosses);
    }
    out.close("phrases");
    out.close("paragraph");
}

fn write_phrase(out: &mut XmlOut, phrase: &Phrase, inherited: Option<&str>, glosses: &GlossIndex<'_>) {
    let language = phrase.language.as_deref().or(inherited);
    let lang = differing(phrase.language.as_deref(), inherited);

    out.open("phrase", &[("guid", phrase.id.as_str())]);
    if let Some(segnum) = phrase.segment_number.as_deref() {
        out.item("segnum", None, Some(segnum));
    }
    if phrase.surface_text.is_some() || lang.is_some() {
        out.item("txt", lang, phrase.surface_text.as_deref());
    }
    if !phrase.words.is_empty() {
        out.open("words", &[]);
        for word in &phrase.words {
            write_word(out, word, language, glosses);
        }
        out.close("words");
    }
    for gloss in glosses_of(glosses, &phrase.id) {
        out.item(gloss.kind.item_type(), gloss.language.as_deref(), Some(gloss.text.as_str()));
    }
    out.close("phrase");
}

fn write_word(out: &mut XmlOut, word: &Word, inherited: Option<&str>, glosses: &GlossIndex<'_>) {
    let language = word.language.as_deref().or(inherited);
    let lang = differing(word.language.as_deref(), inherited);

    match word.guid.as_deref() {
        Some(guid) => out.open("word", &[("guid", guid)]),
        None => out.open("word", &[]),
    }
    if word.is_punctuation {
        out.item("punct", lang, Some(word.surface_form.as_str()));
        out.close("word");
        return;
    }

    out.item("txt", lang, Some(word.surface_form.as_str()));
    if let Some(gloss) = word.gloss.as_deref() {
        out.item("gls", word.gloss_language.as_deref(), Some(gloss));
    }
    write_extra_glosses(out, glosses_of(glosses, &word.id));
    if let Some(pos) = word.part_of_speech.as_deref() {
        out.item("pos", None, Some(pos));
    }
    if !word.morphemes.is_empty() {
        out.open("morphemes", &[]);
        for morpheme in &word.morphemes {
            write_morpheme(out, morpheme, language, glosses);
        }
        out.close("morphemes");
    }
    out.close("word");
}

fn write_morpheme(out: &mut XmlOut, morpheme: &Morpheme, inherited: Option<&str>, glosses: &GlossIndex<'_>) {
    let lang = differing(morpheme.language.as_deref(), inherited);

    let morph_type = ("type", morpheme.morph_type.as_str());
    match morpheme.guid.as_deref() {
        Some(guid) => out.open("morph", &[("guid", guid), morph_type]),
        None => out.open("morph", &[morph_type]),
    }
    out.item("txt", lang, Some(morpheme.surface_form.as_str()));
    if let Some(citation_form) = morpheme.citation_form.as_deref() {
        out.item("cf", None, Some(citation_form));
    }
    if let Some(gloss) = morpheme.gloss.as_deref() {
        out.item("gls", morpheme.gloss_language.as_deref(), Some(gloss));
    }
    write_extra_glosses(out, glosses_of(glosses, &morpheme.id));
    if let Some(msa) = morpheme.msa.as_deref() {
        out.item("msa", None, Some(msa));
    }
    out.close("morph");
}

// Word and morpheme glosses beyond the first one.
fn write_extra_glosses<'a>(out: &mut XmlOut, glosses: impl Iterator<Item = &'a Gloss>) {
    for gloss in glosses {
        out.item(gloss.kind.item_type(), gloss.language.as_deref(), Some(gloss.text.as_str()));
    }
}

fn glosses_of<'a>(glosses: &'a GlossIndex<'a>, target_id: &str) -> impl Iterator<Item = &'a Gloss> {
    glosses.get(target_id).into_iter().flatten().copied()
}

fn differing<'a>(language: Option<&'a str>, inherited: Option<&str>) -> Option<&'a str> {
    language.filter(|language| Some(*language) != inherited)
}

#[derive(Default)]
struct XmlOut {
    buf: String,
    depth: usize,
}

impl XmlOut {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    fn start_tag(name: &str, attributes: &[(&str, &str)]) -> String {
        let mut tag = format!("<{name}");
        for (key, value) in attributes {
            tag.push(' ');
            tag.push_str(key);
            tag.push_str("=\"");
            tag.push_str(&escape(value));
            tag.push('"');
        }
        tag
    }

    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) {
        let mut tag = Self::start_tag(name, attributes);
        tag.push('>');
        self.line(&tag);
        self.depth += 1;
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) {
        let mut tag = Self::start_tag(name, attributes);
        tag.push_str("/>");
        self.line(&tag);
    }

    fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{name}>"));
    }

    fn item(&mut self, item_type: &str, lang: Option<&str>, text: Option<&str>) {
        let mut attributes = vec![("type", item_type)];
        if let Some(lang) = lang {
            attributes.push(("lang", lang));
        }
        match text {
            Some(text) => {
                let mut tag = Self::start_tag("item", &attributes);
                tag.push('>');
                tag.push_str(&escape(text));
                tag.push_str("</item>");
                self.line(&tag);
            }
            None => self.empty("item", &attributes),
        }
    }
}

fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}
