use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use igt_core::analytics::{FrequencyItem, FrequencyQuery};
use igt_core::control::{IgtControlPlane, ImportReport, ImportRequest};
use igt_core::exporters::{ExportArtifact, ExportFormat};
use igt_core::parsers::{FlextextParser, ParseOptions};
use igt_core::store::GraphStore;
use serde::Serialize;
use tracing::{info, warn};

type CommandResult<T> = Result<T, Box<dyn Error>>;

const DEFAULT_LIST_LIMIT: usize = 100;
const DEFAULT_ISSUE_LIMIT: usize = 100;
const DEFAULT_ALLOMORPH_LIMIT: usize = 50;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import `.flextext` files, replacing any stored copy of their texts.
    Import {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Export one stored text, or the whole corpus when no id is given.
    Export {
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value_t = ExportFormat::Flextext)]
        format: ExportFormat,
        /// Directory to write the artifact into; stdout when omitted.
        #[arg(long, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Files to import before exporting.
        #[arg(long = "load", value_name = "FILE")]
        load: Vec<PathBuf>,
    },
    /// Print statistics for one stored text, or the whole corpus.
    Stats {
        #[arg(long)]
        id: Option<String>,
        #[arg(long = "load", value_name = "FILE")]
        load: Vec<PathBuf>,
    },
    /// Count wordforms, morpheme citation forms or part-of-speech tags.
    Frequency {
        #[arg(long, default_value_t = FrequencyItem::Word)]
        item: FrequencyItem,
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value_t = 1)]
        min_frequency: usize,
        #[arg(long, default_value_t = FrequencyQuery::DEFAULT_LIMIT)]
        limit: usize,
        #[arg(long = "load", value_name = "FILE")]
        load: Vec<PathBuf>,
    },
    /// Report morphemes whose types, analyses or glosses disagree.
    Quality {
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value_t = DEFAULT_ISSUE_LIMIT)]
        limit: usize,
        #[arg(long = "load", value_name = "FILE")]
        load: Vec<PathBuf>,
    },
    /// Group surface variants of each morpheme citation form.
    Allomorphs {
        #[arg(long)]
        language: Option<String>,
        #[arg(long, default_value_t = 2)]
        min_variants: usize,
        #[arg(long, default_value_t = DEFAULT_ALLOMORPH_LIMIT)]
        limit: usize,
        #[arg(long = "load", value_name = "FILE")]
        load: Vec<PathBuf>,
    },
    /// List stored texts.
    List {
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// Import a file, export every text it holds and check that re-parsing
    /// the export yields the same trees.
    Roundtrip {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

pub async fn run<S: GraphStore>(control: &IgtControlPlane<S>, command: Command) -> CommandResult<()> {
    match command {
        Command::Import { files } => {
            let reports = import_files(control, &files).await?;
            print_json(&reports)
        }
        Command::Export {
            id,
            format,
            output,
            load,
        } => {
            import_files(control, &load).await?;
            let artifact = match id.as_deref() {
                Some(id) => control.export_document(id, format).await?,
                None => control.export_corpus(format).await?,
            };
            write_artifact(&artifact, output.as_deref()).await
        }
        Command::Stats { id, load } => {
            import_files(control, &load).await?;
            let stats = match id.as_deref() {
                Some(id) => control.document_stats(id).await?,
                None => control.corpus_stats().await?,
            };
            print_json(&stats)
        }
        Command::Frequency {
            item,
            language,
            min_frequency,
            limit,
            load,
        } => {
            import_files(control, &load).await?;
            let query = FrequencyQuery {
                item,
                language,
                min_frequency,
                limit,
            };
            print_json(&control.frequency(&query).await?)
        }
        Command::Quality { language, limit, load } => {
            import_files(control, &load).await?;
            print_json(&control.morpheme_issues(language.as_deref(), limit).await?)
        }
        Command::Allomorphs {
            language,
            min_variants,
            limit,
            load,
        } => {
            import_files(control, &load).await?;
            print_json(&control.allomorphs(language.as_deref(), min_variants, limit).await?)
        }
        Command::List { limit } => print_json(&control.list_documents(limit).await?),
        Command::Roundtrip { file } => roundtrip(control, &file).await,
    }
}

async fn import_files<S: GraphStore>(
    control: &IgtControlPlane<S>,
    files: &[PathBuf],
) -> CommandResult<Vec<ImportReport>> {
    let mut reports = Vec::with_capacity(files.len());
    for path in files {
        let xml = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
        let report = control
            .import_flextext(ImportRequest {
                xml,
                source_path: Some(path.display().to_string()),
            })
            .await?;
        reports.push(report);
    }
    Ok(reports)
}

async fn roundtrip<S: GraphStore>(control: &IgtControlPlane<S>, path: &Path) -> CommandResult<()> {
    let original = FlextextParser::parse_file(path, ParseOptions::new()).await?;
    let reports = import_files(control, std::slice::from_ref(&path.to_path_buf())).await?;

    let mut mismatched = Vec::new();
    for expected in &original.documents {
        let artifact = control
            .export_document(&expected.id, ExportFormat::Flextext)
            .await?;
        let reparsed = FlextextParser::parse(&artifact.content, &ParseOptions::new())?;
        if reparsed.documents.as_slice() == std::slice::from_ref(expected) {
            info!(document_id = %expected.id, "round trip preserved document");
        } else {
            warn!(document_id = %expected.id, "round trip changed document");
            mismatched.push(expected.id.clone());
        }
    }

    print_json(&reports)?;
    if mismatched.is_empty() {
        Ok(())
    } else {
        Err(format!("round trip changed {} document(s): {}", mismatched.len(), mismatched.join(", ")).into())
    }
}

async fn write_artifact(artifact: &ExportArtifact, output: Option<&Path>) -> CommandResult<()> {
    let Some(dir) = output else {
        println!("{}", artifact.content);
        return Ok(());
    };
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&artifact.file_name);
    tokio::fs::write(&path, artifact.content.as_bytes()).await?;
    info!(path = %path.display(), media_type = %artifact.media_type, "wrote export");
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
