use std::path::PathBuf;

use igt_core::analytics::{FrequencyItem, FrequencyQuery};
use igt_core::control::{ErrorKind, IgtControlPlane, ImportRequest};
use igt_core::exporters::{ExportFormat, FlextextWriter};
use igt_core::graph::{DocumentRecords, materialize, reconstruct};
use igt_core::parsers::{FlextextParser, ParseOptions, ParseOutput};
use igt_core::store::{GraphStore, MemoryGraphStore, SurrealGraphStore};
use igt_store::tree::Document;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

const SOURCE_PATH: &str = "corpus/sample.flextext";
const FOX_TEXT_ID: &str = "5f2c1d0e-7a43-4b1e-9c55-0d6a3e2b8f10";

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("sample.flextext")
}

fn load_fixture() -> String {
    let path = fixture_path();
    std::fs::read_to_string(&path).unwrap_or_else(|err| {
        let path_display = path.display();
        panic!("failed to read flextext fixture at {path_display}: {err}")
    })
}

fn parse_fixture() -> ParseOutput {
    let xml = load_fixture();
    let options = ParseOptions::new().with_source_name("sample.flextext");
    FlextextParser::parse(&xml, &options)
        .unwrap_or_else(|err| panic!("failed to parse flextext fixture: {err}"))
}

async fn build_control_plane(db_name: &str) -> IgtControlPlane<SurrealGraphStore<Db>> {
    let db = Surreal::new::<Mem>(())
        .await
        .expect("failed to create in-memory surrealdb instance");
    db.use_ns("igt")
        .use_db(db_name)
        .await
        .expect("failed to select surrealdb namespace/db");
    IgtControlPlane::new(db)
}

fn import_request(xml: String) -> ImportRequest {
    ImportRequest {
        xml,
        source_path: Some(SOURCE_PATH.to_string()),
    }
}

fn reparse(xml: &str) -> Vec<Document> {
    FlextextParser::parse(xml, &ParseOptions::new())
        .unwrap_or_else(|err| panic!("failed to reparse exported flextext: {err}"))
        .documents
}

#[test]
fn fixture_trees_survive_serialization() {
    let parsed = parse_fixture();
    assert_eq!(parsed.documents.len(), 2);
    assert!(parsed.warnings.is_empty(), "unexpected warnings: {:?}", parsed.warnings);
    for document in &parsed.documents {
        assert!(
            document.invariant_violations().is_empty(),
            "{:?}",
            document.invariant_violations()
        );
    }

    let xml = FlextextWriter::write_corpus(&parsed.documents);
    assert_eq!(reparse(&xml), parsed.documents);
}

#[test]
fn fixture_trees_survive_graph_projection() {
    let parsed = parse_fixture();
    for document in &parsed.documents {
        let materialized = materialize(document);
        let subgraph = materialized
            .batch
            .to_subgraph()
            .expect("batch should contain its document node");
        let rebuilt = reconstruct(DocumentRecords::from_subgraph(subgraph));
        assert!(rebuilt.warnings.is_empty(), "{:?}", rebuilt.warnings);
        assert_eq!(&rebuilt.document, document);
    }
}

#[test]
fn texts_without_guid_get_stable_ids() {
    let first = parse_fixture();
    let second = parse_fixture();
    let unnamed = &first.documents[1];
    assert_eq!(unnamed.id, second.documents[1].id);
    assert_ne!(unnamed.id, FOX_TEXT_ID);
    assert_eq!(unnamed.title.as_deref(), Some("Sin identificador"));
    assert_eq!(unnamed.default_language.as_deref(), Some("es"));

    let phrase = &unnamed.sections[0].phrases[0];
    assert_eq!(phrase.surface_text.as_deref(), Some("hola <mundo>"));
    assert_eq!(phrase.language.as_deref(), Some("es"));
}

#[tokio::test]
async fn import_fixture_reports_documents_and_stats() {
    let control = build_control_plane("import_report").await;
    let report = control
        .import_flextext(import_request(load_fixture()))
        .await
        .expect("import should succeed");

    assert_eq!(report.source_kind, "flextext");
    assert_eq!(report.source_path.as_deref(), Some(SOURCE_PATH));
    assert_eq!(report.documents.len(), 2);
    let fox = &report.documents[0];
    assert_eq!(fox.document_id, FOX_TEXT_ID);
    assert_eq!(fox.title.as_deref(), Some("The Fox and the Crow"));
    // text, 2 sections, 3 phrases, 7 words, 6 morphemes, 5 glosses
    assert_eq!(fox.node_count, 24);
    // one parent edge per non-text node plus section_has_word per word
    assert_eq!(fox.edge_count, 23 + 7);
    assert_eq!(fox.languages, vec!["en".to_string(), "es".to_string(), "zpq".to_string()]);
    assert!(report.documents.iter().all(|document| !document.replaced));

    let stats = &report.stats;
    assert_eq!(stats.total_texts, 2);
    assert_eq!(stats.annotated_texts, 2);
    assert_eq!(stats.total_sections, 3);
    assert_eq!(stats.total_phrases, 4);
    assert_eq!(stats.total_words, 8);
    assert_eq!(stats.punctuation_words, 2);
    assert_eq!(stats.words_with_morphemes, 3);
    assert_eq!(stats.words_with_only_translation, 2);
    assert_eq!(stats.words_whitespace_only, 1);
    assert_eq!(stats.total_morphemes, 6);
    assert_eq!(stats.total_glosses, 5);
    assert_eq!(stats.morpheme_types.get("stem"), Some(&2));
    assert_eq!(stats.morpheme_types.get("prefix"), Some(&2));
    assert_eq!(stats.morpheme_types.get("root"), Some(&1));
    assert_eq!(stats.morpheme_types.get("suffix"), Some(&1));
    assert!(stats.pos_tags.contains("n") && stats.pos_tags.contains("v"));
}

#[tokio::test]
async fn stored_documents_export_back_to_the_parsed_trees() {
    let parsed = parse_fixture();
    let control = build_control_plane("export_roundtrip").await;
    control
        .import_flextext(ImportRequest {
            xml: load_fixture(),
            source_path: Some("sample.flextext".to_string()),
        })
        .await
        .expect("import should succeed");

    for expected in &parsed.documents {
        let artifact = control
            .export_document(&expected.id, ExportFormat::Flextext)
            .await
            .expect("export should succeed");
        assert_eq!(artifact.media_type, "application/xml");
        assert_eq!(artifact.file_name, format!("{}.flextext", expected.id));
        assert_eq!(reparse(&artifact.content), vec![expected.clone()]);
    }

    let corpus = control
        .export_corpus(ExportFormat::Flextext)
        .await
        .expect("corpus export should succeed");
    assert_eq!(corpus.file_name, "interlinear_texts.flextext");
    let mut exported = reparse(&corpus.content);
    let mut expected = parsed.documents.clone();
    exported.sort_by(|left, right| left.id.cmp(&right.id));
    expected.sort_by(|left, right| left.id.cmp(&right.id));
    assert_eq!(exported, expected);
}

#[tokio::test]
async fn reimport_replaces_the_stored_subgraph() {
    let control = build_control_plane("reimport").await;
    let xml = load_fixture();
    control
        .import_flextext(import_request(xml.clone()))
        .await
        .expect("first import should succeed");
    let first = control
        .store()
        .read_document(FOX_TEXT_ID)
        .await
        .expect("read should succeed")
        .expect("document should be stored");

    let again = control
        .import_flextext(import_request(xml.clone()))
        .await
        .expect("second import should succeed");
    assert!(again.documents.iter().all(|document| document.replaced));
    let second = control
        .store()
        .read_document(FOX_TEXT_ID)
        .await
        .expect("read should succeed")
        .expect("document should be stored");
    assert_eq!(first.words.len(), second.words.len());
    assert_eq!(first.morphemes.len(), second.morphemes.len());
    assert_eq!(first.relations.len(), second.relations.len());

    let listed = control.list_documents(10).await.expect("list should succeed");
    assert_eq!(listed.len(), 2);

    let trimmed = xml.replace(
        r#"<item type="note" lang="en">Speaker hesitates here.</item>"#,
        "",
    );
    control
        .import_flextext(import_request(trimmed))
        .await
        .expect("third import should succeed");
    let stats = control
        .document_stats(FOX_TEXT_ID)
        .await
        .expect("stats should succeed");
    assert_eq!(stats.total_glosses, 4);
}

#[tokio::test]
async fn punctuation_words_keep_their_flag_through_storage() {
    let control = build_control_plane("punctuation").await;
    control
        .import_flextext(import_request(load_fixture()))
        .await
        .expect("import should succeed");

    let reconstruction = control
        .load_document(FOX_TEXT_ID)
        .await
        .expect("load should succeed");
    assert!(reconstruction.warnings.is_empty());
    let punctuation: Vec<_> = reconstruction
        .document
        .words()
        .filter(|word| word.is_punctuation)
        .collect();
    assert_eq!(punctuation.len(), 2);
    assert_eq!(punctuation[0].surface_form, ".");
    assert!(punctuation[0].gloss.is_none());
    assert!(punctuation[0].morphemes.is_empty());
    assert_eq!(punctuation[1].surface_form, "!");
    assert_eq!(punctuation[1].language.as_deref(), Some("zpq"));
}

#[tokio::test]
async fn unknown_document_is_not_found() {
    let control = build_control_plane("missing").await;
    let err = control
        .export_document("no-such-text", ExportFormat::Json)
        .await
        .expect_err("export of an unknown id should fail");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = control
        .document_stats("no-such-text")
        .await
        .expect_err("stats of an unknown id should fail");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn empty_store_has_nothing_to_export() {
    let control = build_control_plane("empty").await;
    let err = control
        .export_corpus(ExportFormat::Flextext)
        .await
        .expect_err("empty corpus export should fail");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let stats = control.corpus_stats().await.expect("stats should succeed");
    assert_eq!(stats.total_texts, 0);
    assert!(control.list_documents(5).await.expect("list should succeed").is_empty());
}

#[tokio::test]
async fn malformed_import_writes_nothing() {
    let control = build_control_plane("malformed").await;
    let err = control
        .import_flextext(import_request("<document><interlinear-text>".to_string()))
        .await
        .expect_err("truncated xml should fail");
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    let stray_phrase = r#"<document><interlinear-text guid="t1"><paragraphs><paragraph guid="p1"><phrase guid="x"/></paragraph></paragraphs></interlinear-text></document>"#;
    let err = control
        .import_flextext(import_request(stray_phrase.to_string()))
        .await
        .expect_err("phrase without container should fail");
    assert_eq!(err.kind(), ErrorKind::MissingContainer);

    assert!(control.store().document_ids().await.expect("ids should load").is_empty());
}

#[tokio::test]
async fn memory_and_surreal_stores_export_identically() {
    let surreal = build_control_plane("parity").await;
    let memory = IgtControlPlane::with_store(MemoryGraphStore::new());
    let xml = load_fixture();

    let surreal_report = surreal
        .import_flextext(import_request(xml.clone()))
        .await
        .expect("surreal import should succeed");
    let memory_report = memory
        .import_flextext(import_request(xml))
        .await
        .expect("memory import should succeed");
    assert_eq!(surreal_report.documents, memory_report.documents);
    assert_eq!(surreal_report.stats, memory_report.stats);

    let from_surreal = surreal
        .export_document(FOX_TEXT_ID, ExportFormat::Flextext)
        .await
        .expect("surreal export should succeed");
    let from_memory = memory
        .export_document(FOX_TEXT_ID, ExportFormat::Flextext)
        .await
        .expect("memory export should succeed");
    assert_eq!(from_surreal.content, from_memory.content);

    assert_eq!(
        surreal.corpus_stats().await.expect("surreal stats"),
        memory.corpus_stats().await.expect("memory stats")
    );
}

#[tokio::test]
async fn json_export_lists_every_text() {
    let control = build_control_plane("json").await;
    control
        .import_flextext(import_request(load_fixture()))
        .await
        .expect("import should succeed");
    let artifact = control
        .export_corpus(ExportFormat::Json)
        .await
        .expect("json export should succeed");
    assert_eq!(artifact.media_type, "application/json");
    assert_eq!(artifact.file_name, "interlinear_texts.json");

    let value: serde_json::Value =
        serde_json::from_str(&artifact.content).expect("export should be valid json");
    let texts = value["texts"].as_array().expect("texts should be an array");
    assert_eq!(texts.len(), 2);
    assert!(value["exported_at"].as_str().is_some_and(|stamp| stamp.ends_with('Z')));
}

const SHARED_GUIDS: &str = r#"<document version="2">
  <interlinear-text guid="shared-guids">
    <item type="title" lang="en">Cats and dogs</item>
    <paragraphs><paragraph guid="s"><phrases><phrase guid="p"><words>
      <word guid="w-the"><item type="txt">the</item><item type="gls" lang="en">DEF</item></word>
      <word guid="w-cat"><item type="txt">cats</item><morphemes>
        <morph guid="m-cat"><item type="txt">cat</item><item type="gls">cat</item></morph>
        <morph guid="m-pl" type="suffix"><item type="txt">s</item><item type="gls">PL</item></morph>
      </morphemes></word>
      <word guid="w-the"><item type="txt">the</item><item type="gls" lang="en">DEF</item></word>
      <word guid="w-dog"><item type="txt">dogs</item><morphemes>
        <morph guid="m-dog"><item type="txt">dog</item><item type="gls">dog</item></morph>
        <morph guid="m-pl" type="suffix"><item type="txt">s</item><item type="gls">PL</item></morph>
      </morphemes></word>
    </words></phrase></phrases></paragraph></paragraphs>
  </interlinear-text>
</document>"#;

#[tokio::test]
async fn repeated_word_and_morpheme_guids_round_trip_through_storage() {
    let expected = FlextextParser::parse(SHARED_GUIDS, &ParseOptions::new())
        .expect("fixture should parse")
        .documents;
    let control = build_control_plane("shared_guids").await;
    let report = control
        .import_flextext(ImportRequest {
            xml: SHARED_GUIDS.to_string(),
            source_path: None,
        })
        .await
        .expect("import should succeed");
    assert!(report.warnings.is_empty());
    assert_eq!(report.stats.total_words, 4);
    assert_eq!(report.stats.total_morphemes, 4);

    let subgraph = control
        .store()
        .read_document("shared-guids")
        .await
        .expect("read should succeed")
        .expect("document should be stored");
    assert_eq!(subgraph.words.len(), 4);
    assert_eq!(subgraph.morphemes.len(), 4);

    let reconstruction = control
        .load_document("shared-guids")
        .await
        .expect("load should succeed");
    assert!(reconstruction.warnings.is_empty(), "{:?}", reconstruction.warnings);
    let forms: Vec<_> = reconstruction
        .document
        .words()
        .map(|word| (word.surface_form.as_str(), word.morphemes.len()))
        .collect();
    assert_eq!(forms, vec![("the", 0), ("cats", 2), ("the", 0), ("dogs", 2)]);

    let artifact = control
        .export_document("shared-guids", ExportFormat::Flextext)
        .await
        .expect("export should succeed");
    assert_eq!(reparse(&artifact.content), expected);
}

#[tokio::test]
async fn untitled_sources_do_not_overwrite_each_other() {
    let control = build_control_plane("guidless").await;
    let story = |title: &str| ImportRequest {
        xml: format!(
            r#"<interlinear-text><item type="title" lang="en">{title}</item>
<paragraphs><paragraph><phrases><phrase><item type="txt">{title}</item></phrase></phrases></paragraph></paragraphs>
</interlinear-text>"#
        ),
        source_path: None,
    };

    let first = control.import_flextext(story("Story A")).await.expect("import should succeed");
    let second = control.import_flextext(story("Story B")).await.expect("import should succeed");
    assert_ne!(first.documents[0].document_id, second.documents[0].document_id);
    assert!(!second.documents[0].replaced);
    assert_eq!(control.store().document_ids().await.expect("ids should load").len(), 2);

    let again = control.import_flextext(story("Story A")).await.expect("import should succeed");
    assert_eq!(again.documents[0].document_id, first.documents[0].document_id);
    assert!(again.documents[0].replaced);
    assert_eq!(control.store().document_ids().await.expect("ids should load").len(), 2);
}

#[tokio::test]
async fn same_file_name_in_different_directories_keeps_both_texts() {
    let control = build_control_plane("same_basename").await;
    let untitled = r#"<interlinear-text><paragraphs><paragraph/></paragraphs></interlinear-text>"#;
    for path in ["north/story.flextext", "south/story.flextext"] {
        control
            .import_flextext(ImportRequest {
                xml: untitled.to_string(),
                source_path: Some(path.to_string()),
            })
            .await
            .expect("import should succeed");
    }
    assert_eq!(control.store().document_ids().await.expect("ids should load").len(), 2);
}

#[tokio::test]
async fn stored_corpus_feeds_frequency_tables() {
    let control = IgtControlPlane::with_store(MemoryGraphStore::new());
    control
        .import_flextext(ImportRequest {
            xml: SHARED_GUIDS.to_string(),
            source_path: None,
        })
        .await
        .expect("import should succeed");

    let words = control
        .frequency(&FrequencyQuery::new(FrequencyItem::Word))
        .await
        .expect("frequency should succeed");
    let counts: Vec<_> = words.iter().map(|entry| (entry.item.as_str(), entry.frequency)).collect();
    assert_eq!(counts, vec![("the", 2), ("cats", 1), ("dogs", 1)]);

    let zero_limit = FrequencyQuery {
        limit: 0,
        ..FrequencyQuery::new(FrequencyItem::Word)
    };
    let err = control.frequency(&zero_limit).await.expect_err("zero limit is rejected");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = control
        .allomorphs(None, 1, 50)
        .await
        .expect_err("a single variant is not an allomorph");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(control.morpheme_issues(None, 100).await.expect("issues should load").is_empty());
}
