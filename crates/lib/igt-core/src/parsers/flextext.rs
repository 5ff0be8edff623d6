use std::{collections::HashSet, error::Error, fmt, path::Path};

use igt_store::schema::{
    KIND_DOCUMENT,
    KIND_GLOSS,
    KIND_MORPHEME,
    KIND_PHRASE,
    KIND_SECTION,
    KIND_WORD,
    synthesize_id,
};
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
use roxmltree::{Document as XmlDocument, Node};
use serde::{Deserialize, Serialize};

/// Options for parsing `.flextext` documents.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Name of the source (usually the file path). Together with the title
    /// it seeds identifiers of interlinear texts that carry no `guid`.
    pub source_name: Option<String>,
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }
}

/// Output from parsing a `.flextext` document.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub documents: Vec<Document>,
    pub warnings: Vec<ParseWarning>,
}

/// Recoverable problem found while parsing, attached to the affected entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseWarning {
    pub entity_id: String,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Malformed,
    MissingContainer,
    Io,
}

/// Error type for `.flextext` parse failures.
#[derive(Debug)]
pub struct ParseError {
    kind: ParseErrorKind,
    message: String,
    path: Option<String>,
    position: Option<(u32, u32)>,
}

impl ParseError {
    fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            position: None,
        }
    }

    fn at(mut self, path: impl Into<String>, position: (u32, u32)) -> Self {
        self.path = Some(path.into());
        self.position = Some(position);
        self
    }

    #[must_use]
    pub const fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Element path of the offending node, when known.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// One-based `(line, column)` of the offending node, when known.
    #[must_use]
    pub const fn position(&self) -> Option<(u32, u32)> {
        self.position
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flextext parse error: {}", self.message)?;
        if let Some(path) = self.path.as_deref() {
            write!(f, " at {path}")?;
        }
        if let Some((line, column)) = self.position {
            write!(f, " (line {line}, column {column})")?;
        }
        Ok(())
    }
}

impl Error for ParseError {}

impl From<roxmltree::Error> for ParseError {
    fn from(err: roxmltree::Error) -> Self {
        let pos = err.pos();
        let mut parsed = Self::new(ParseErrorKind::Malformed, err.to_string());
        parsed.position = Some((pos.row, pos.col));
        parsed
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ParseErrorKind::Io, err.to_string())
    }
}

impl From<tokio::task::JoinError> for ParseError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::new(ParseErrorKind::Io, err.to_string())
    }
}

/// Parser for FLEx `.flextext` interlinear text files.
pub struct FlextextParser;

impl FlextextParser {
    /// Parses `.flextext` XML into document trees.
    ///
    /// Language inheritance is resolved here, once: every phrase, word and
    /// morpheme leaves the parser carrying its effective language.
    ///
    /// # Errors
    /// Returns `ParseError` if the XML is malformed, the root element is not a
    /// flextext root, or a populated child list lacks its wrapper container.
    pub fn parse(xml: &str, options: &ParseOptions) -> Result<ParseOutput, ParseError> {
        let xml_doc = XmlDocument::parse(xml)?;
        let root = xml_doc.root_element();
        let mut context = Context::new(&xml_doc);

        let (texts, root_path) = match root.tag_name().name() {
            "document" => {
                let texts: Vec<_> = root
                    .children()
                    .filter(|node| node.has_tag_name("interlinear-text"))
                    .collect();
                (texts, "document".to_string())
            }
            "interlinear-text" => (vec![root], String::new()),
            other => {
                return Err(ParseError::new(
                    ParseErrorKind::Malformed,
                    format!("unexpected root element <{other}>"),
                )
                .at(other, context.position(root)));
            }
        };

        let seed = options.source_name.as_deref().unwrap_or_default();
        let mut documents = Vec::with_capacity(texts.len());
        for (index, text) in texts.into_iter().enumerate() {
            let path = join_path(&root_path, &format!("interlinear-text[{index}]"));
            documents.push(context.parse_text(text, seed, index, &path)?);
        }

        Ok(ParseOutput {
            documents,
            warnings: context.warnings,
        })
    }

    /// Parses XML asynchronously using a blocking task.
    ///
    /// # Errors
    /// Returns `ParseError` if parsing fails or the task panics.
    pub async fn parse_async(xml: String, options: ParseOptions) -> Result<ParseOutput, ParseError> {
        tokio::task::spawn_blocking(move || Self::parse(&xml, &options)).await?
    }

    /// Parses a `.flextext` file asynchronously. The path seeds synthesized
    /// document identifiers unless the options already name a source.
    ///
    /// # Errors
    /// Returns `ParseError` if the file cannot be read or the XML cannot be parsed.
    pub async fn parse_file(
        path: impl AsRef<Path>,
        options: ParseOptions,
    ) -> Result<ParseOutput, ParseError> {
        let path = path.as_ref().to_path_buf();
        let options = if options.source_name.is_some() {
            options
        } else {
            let name = path.display().to_string();
            options.with_source_name(name)
        };
        let xml = tokio::fs::read_to_string(path).await?;
        Self::parse_async(xml, options).await
    }
}

struct Context<'d, 'input> {
    xml: &'d XmlDocument<'input>,
    warnings: Vec<ParseWarning>,
    glosses: Vec<Gloss>,
    seen: HashSet<String>,
}

struct Item<'d> {
    item_type: &'d str,
    lang: Option<String>,
    text: Option<String>,
}

impl<'d, 'input> Context<'d, 'input> {
    fn new(xml: &'d XmlDocument<'input>) -> Self {
        Self {
            xml,
            warnings: Vec::new(),
            glosses: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn position(&self, node: Node<'d, 'input>) -> (u32, u32) {
        let pos = self.xml.text_pos_at(node.range().start);
        (pos.row, pos.col)
    }

    fn warn(&mut self, entity_id: &str, path: &str, message: impl Into<String>) {
        self.warnings.push(ParseWarning {
            entity_id: entity_id.to_string(),
            path: path.to_string(),
            message: message.into(),
        });
    }

    /// Finds the wrapper `container` under `parent`, failing when a `child`
    /// element sits directly under `parent` without it.
    fn container(
        &self,
        parent: Node<'d, 'input>,
        container: &str,
        child: &str,
        path: &str,
    ) -> Result<Option<Node<'d, 'input>>, ParseError> {
        if let Some(stray) = parent.children().find(|node| node.has_tag_name(child)) {
            return Err(ParseError::new(
                ParseErrorKind::MissingContainer,
                format!("<{child}> must be wrapped in <{container}>"),
            )
            .at(join_path(path, child), self.position(stray)));
        }
        Ok(parent.children().find(|node| node.has_tag_name(container)))
    }

    /// Id of a paragraph or phrase. Its `guid` must not repeat within the text.
    fn structural_id(
        &mut self,
        element: Node<'d, 'input>,
        parent_id: &str,
        kind: &str,
        position: usize,
        path: &str,
    ) -> Result<String, ParseError> {
        let id = source_guid(element).unwrap_or_else(|| synthesize_id(parent_id, kind, position));
        if !self.seen.insert(id.clone()) {
            return Err(ParseError::new(
                ParseErrorKind::Malformed,
                format!("guid {id} is used by more than one element"),
            )
            .at(path, self.position(element)));
        }
        Ok(id)
    }

    /// Id of one word or morpheme occurrence, plus the `guid` the file gave it.
    ///
    /// FLEx repeats the analysis guid on every occurrence of a wordform or
    /// morpheme, so only the first occurrence in a text takes the guid as its
    /// id; later ones get a positional id.
    fn occurrence_id(
        &mut self,
        element: Node<'d, 'input>,
        parent_id: &str,
        kind: &str,
        position: usize,
    ) -> (String, Option<String>) {
        let guid = source_guid(element);
        let id = match &guid {
            Some(guid) if !self.seen.contains(guid) => guid.clone(),
            _ => synthesize_id(parent_id, kind, position),
        };
        self.seen.insert(id.clone());
        (id, guid)
    }

    fn push_gloss(&mut self, target: GlossTarget, kind: GlossKind, text: String, language: Option<String>) {
        let index = self
            .glosses
            .iter()
            .filter(|gloss| gloss.target == target)
            .count();
        self.glosses.push(Gloss {
            id: synthesize_id(&target.id, KIND_GLOSS, index),
            target,
            kind,
            text,
            language,
        });
    }

    fn parse_text(
        &mut self,
        element: Node<'d, 'input>,
        seed: &str,
        index: usize,
        path: &str,
    ) -> Result<Document, ParseError> {
        let mut title = None;
        let mut source = None;
        let mut comment = None;
        let mut default_language = None;

        for item in items(element) {
            match item.item_type {
                "title" => {
                    if default_language.is_none() {
                        default_language.clone_from(&item.lang);
                    }
                    if title.is_none() {
                        title = item.text;
                    }
                }
                "source" if source.is_none() => source = item.text,
                "comment" if comment.is_none() => comment = item.text,
                _ => {}
            }
        }

        let id = source_guid(element).unwrap_or_else(|| {
            let seed = format!("{seed}|{}", title.as_deref().unwrap_or_default());
            synthesize_id(&seed, KIND_DOCUMENT, index)
        });
        self.glosses.clear();
        self.seen.clear();
        self.seen.insert(id.clone());
        let mut sections = Vec::new();
        if let Some(paragraphs) = self.container(element, "paragraphs", "paragraph", path)? {
            let paragraphs_path = join_path(path, "paragraphs");
            for (position, paragraph) in ordered_children(paragraphs, "paragraph").into_iter().enumerate() {
                let paragraph_path = format!("{paragraphs_path}/paragraph[{position}]");
                sections.push(self.parse_section(
                    paragraph,
                    &id,
                    position,
                    default_language.as_ref(),
                    &paragraph_path,
                )?);
            }
        }

        Ok(Document {
            id,
            title,
            source,
            comment,
            default_language,
            sections,
            glosses: std::mem::take(&mut self.glosses),
        })
    }

    fn parse_section(
        &mut self,
        element: Node<'d, 'input>,
        document_id: &str,
        position: usize,
        default_language: Option<&String>,
        path: &str,
    ) -> Result<Section, ParseError> {
        let id = self.structural_id(element, document_id, KIND_SECTION, position, path)?;
        let mut phrases = Vec::new();
        if let Some(container) = self.container(element, "phrases", "phrase", path)? {
            let phrases_path = join_path(path, "phrases");
            for (index, phrase) in ordered_children(container, "phrase").into_iter().enumerate() {
                let phrase_path = format!("{phrases_path}/phrase[{index}]");
                phrases.push(self.parse_phrase(phrase, &id, index, default_language, &phrase_path)?);
            }
        }
        Ok(Section {
            id,
            order: to_order(position),
            phrases,
        })
    }

    fn parse_phrase(
        &mut self,
        element: Node<'d, 'input>,
        section_id: &str,
        position: usize,
        default_language: Option<&String>,
        path: &str,
    ) -> Result<Phrase, ParseError> {
        let id = self.structural_id(element, section_id, KIND_PHRASE, position, path)?;
        let target = GlossTarget {
            kind: TargetKind::Phrase,
            id: id.clone(),
        };
        let mut segment_number = None;
        let mut surface_text = None;
        let mut explicit_language = None;

        for item in items(element) {
            match item.item_type {
                "segnum" if segment_number.is_none() => segment_number = item.text,
                "txt" if surface_text.is_none() => {
                    surface_text = item.text;
                    explicit_language = item.lang;
                }
                other => {
                    if let (Some(kind), Some(text)) = (GlossKind::from_item_type(other), item.text) {
                        self.push_gloss(target.clone(), kind, text, item.lang);
                    }
                }
            }
        }

        let language = explicit_language.or_else(|| default_language.cloned());
        let mut words = Vec::new();
        if let Some(container) = self.container(element, "words", "word", path)? {
            let words_path = join_path(path, "words");
            for (index, word) in ordered_children(container, "word").into_iter().enumerate() {
                let word_path = format!("{words_path}/word[{index}]");
                words.push(self.parse_word(word, &id, index, language.as_ref(), &word_path)?);
            }
        }

        Ok(Phrase {
            id,
            order: to_order(position),
            segment_number,
            surface_text,
            language,
            words,
        })
    }

    fn parse_word(
        &mut self,
        element: Node<'d, 'input>,
        phrase_id: &str,
        position: usize,
        phrase_language: Option<&String>,
        path: &str,
    ) -> Result<Word, ParseError> {
        let (id, guid) = self.occurrence_id(element, phrase_id, KIND_WORD, position);
        let word_items: Vec<Item<'d>> = items(element).collect();

        // A punctuation item makes the whole unit punctuation; morphemes are never read.
        if let Some(punct) = word_items.iter().find(|item| item.item_type == "punct") {
            let language = punct.lang.clone().or_else(|| phrase_language.cloned());
            if punct.text.is_none() {
                self.warn(&id, path, "punctuation item is empty");
            }
            return Ok(Word {
                guid,
                ..Word::punctuation(id, punct.text.clone().unwrap_or_default(), language)
            });
        }

        let target = GlossTarget {
            kind: TargetKind::Word,
            id: id.clone(),
        };
        let mut surface_form = None;
        let mut explicit_language = None;
        let mut gloss = None;
        let mut gloss_language = None;
        let mut part_of_speech = None;

        for item in word_items {
            match item.item_type {
                "txt" if surface_form.is_none() => {
                    surface_form = item.text;
                    explicit_language = item.lang;
                }
                "gls" => match item.text {
                    Some(text) if gloss.is_some() => {
                        self.push_gloss(target.clone(), GlossKind::Free, text, item.lang);
                    }
                    Some(text) => {
                        gloss = Some(text);
                        gloss_language = item.lang;
                    }
                    None => {}
                },
                "pos" if part_of_speech.is_none() => part_of_speech = item.text,
                _ => {}
            }
        }

        if surface_form.is_none() {
            self.warn(&id, path, "word has no surface form");
        }
        let language = explicit_language.or_else(|| phrase_language.cloned());

        let mut morphemes = Vec::new();
        if let Some(container) = self.container(element, "morphemes", "morph", path)? {
            let morphemes_path = join_path(path, "morphemes");
            for (index, morph) in ordered_children(container, "morph").into_iter().enumerate() {
                let morph_path = format!("{morphemes_path}/morph[{index}]");
                morphemes.push(self.parse_morpheme(morph, &id, index, language.as_ref(), &morph_path));
            }
        }

        Ok(Word {
            id,
            guid,
            surface_form: surface_form.unwrap_or_default(),
            gloss,
            gloss_language,
            part_of_speech,
            language,
            is_punctuation: false,
            morphemes,
        })
    }

    fn parse_morpheme(
        &mut self,
        element: Node<'d, 'input>,
        word_id: &str,
        position: usize,
        word_language: Option<&String>,
        path: &str,
    ) -> Morpheme {
        let (id, guid) = self.occurrence_id(element, word_id, KIND_MORPHEME, position);
        let morph_type = match element.attribute("type").and_then(non_empty) {
            None => MorphemeType::Stem,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                self.warn(
                    &id,
                    path,
                    format!("unknown morpheme type '{raw}', using '{}'", MorphemeType::Stem),
                );
                MorphemeType::Stem
            }),
        };

        let target = GlossTarget {
            kind: TargetKind::Morpheme,
            id: id.clone(),
        };
        let mut surface_form = None;
        let mut explicit_language = None;
        let mut citation_form = None;
        let mut gloss = None;
        let mut gloss_language = None;
        let mut msa = None;

        for item in items(element) {
            match item.item_type {
                "txt" if surface_form.is_none() => {
                    surface_form = item.text;
                    explicit_language = item.lang;
                }
                "cf" if citation_form.is_none() => citation_form = item.text,
                "gls" => match item.text {
                    Some(text) if gloss.is_some() => {
                        self.push_gloss(target.clone(), GlossKind::Free, text, item.lang);
                    }
                    Some(text) => {
                        gloss = Some(text);
                        gloss_language = item.lang;
                    }
                    None => {}
                },
                "msa" if msa.is_none() => msa = item.text,
                _ => {}
            }
        }

        if surface_form.is_none() {
            self.warn(&id, path, "morpheme has no surface form");
        }

        Morpheme {
            id,
            guid,
            morph_type,
            surface_form: surface_form.unwrap_or_default(),
            citation_form,
            gloss,
            gloss_language,
            msa,
            language: explicit_language.or_else(|| word_language.cloned()),
        }
    }
}

fn items<'d, 'input>(element: Node<'d, 'input>) -> impl Iterator<Item = Item<'d>> {
    element
        .children()
        .filter(|node| node.has_tag_name("item"))
        .map(|node| Item {
            item_type: node.attribute("type").unwrap_or(""),
            lang: node.attribute("lang").map(str::trim).and_then(non_empty),
            text: node.text().and_then(non_empty),
        })
}

/// Children named `tag`, in document order unless every one of them carries a
/// numeric `order` attribute.
fn ordered_children<'d, 'input>(parent: Node<'d, 'input>, tag: &str) -> Vec<Node<'d, 'input>> {
    let children: Vec<_> = parent
        .children()
        .filter(|node| node.has_tag_name(tag))
        .collect();
    let explicit: Option<Vec<u32>> = children
        .iter()
        .map(|node| node.attribute("order").and_then(|value| value.trim().parse().ok()))
        .collect();
    match explicit {
        Some(orders) if !children.is_empty() => {
            let mut pairs: Vec<_> = orders.into_iter().zip(children).collect();
            pairs.sort_by_key(|(order, _)| *order);
            pairs.into_iter().map(|(_, node)| node).collect()
        }
        _ => children,
    }
}

fn source_guid(element: Node<'_, '_>) -> Option<String> {
    element.attribute("guid").map(str::trim).and_then(non_empty)
}

fn join_path(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}/{segment}")
    }
}

fn to_order(position: usize) -> u32 {
    u32::try_from(position).unwrap_or(u32::MAX)
}
