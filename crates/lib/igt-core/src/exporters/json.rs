use chrono::{DateTime, SecondsFormat, Utc};
use igt_store::tree::Document;
use serde::Serialize;

use super::ExportError;

/// Exports document trees as pretty-printed JSON.
pub struct JsonExporter;

#[derive(Serialize)]
struct JsonExport<'a> {
    exported_at: String,
    texts: &'a [Document],
}

impl JsonExporter {
    /// Exports documents stamped with the current time.
    ///
    /// # Errors
    /// Returns `ExportError` if serialization fails.
    pub fn export(documents: &[Document]) -> Result<String, ExportError> {
        Self::export_at(documents, Utc::now())
    }

    /// Exports documents with an explicit timestamp.
    ///
    /// # Errors
    /// Returns `ExportError` if serialization fails.
    pub fn export_at(documents: &[Document], exported_at: DateTime<Utc>) -> Result<String, ExportError> {
        let payload = JsonExport {
            exported_at: exported_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            texts: documents,
        };
        Ok(serde_json::to_string_pretty(&payload)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::Value;

    use super::*;
    use crate::parsers::{FlextextParser, ParseOptions};

    #[test]
    fn exports_tree_shape_with_timestamp() {
        let xml = r#"<interlinear-text guid="t">
  <item type="title" lang="en">Demo</item>
  <paragraphs><paragraph guid="s"><phrases><phrase guid="p"><words>
    <word guid="w"><item type="txt">hi</item></word>
  </words></phrase></phrases></paragraph></paragraphs>
</interlinear-text>"#;
        let documents = FlextextParser::parse(xml, &ParseOptions::new())
            .expect("fixture should parse")
            .documents;
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid time");

        let json = JsonExporter::export_at(&documents, at).expect("export should succeed");
        let value: Value = serde_json::from_str(&json).expect("export is JSON");

        assert_eq!(value["exported_at"], "2024-05-01T12:00:00Z");
        let text = &value["texts"][0];
        assert_eq!(text["id"], "t");
        assert_eq!(text["default_language"], "en");
        let word = &text["sections"][0]["phrases"][0]["words"][0];
        assert_eq!(word["surface_form"], "hi");
        assert_eq!(word["language"], "en");
        assert!(word.get("gloss").is_none());
    }

    #[test]
    fn exported_texts_deserialize_back_into_trees() {
        let xml = r#"<interlinear-text guid="t"><item type="source">notes</item></interlinear-text>"#;
        let documents = FlextextParser::parse(xml, &ParseOptions::new())
            .expect("fixture should parse")
            .documents;
        let json = JsonExporter::export(&documents).expect("export should succeed");
        let value: Value = serde_json::from_str(&json).expect("export is JSON");
        let texts: Vec<Document> = serde_json::from_value(value["texts"].clone()).expect("tree shape");
        assert_eq!(texts, documents);
    }
}
