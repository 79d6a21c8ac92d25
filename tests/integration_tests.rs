//! Integration tests for Research Scribe
//!
//! These tests drive the public pipeline end to end with scripted model
//! replies, an in-memory search source and mockito HTTP servers.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use research_scribe::config::{Config, DownloadConfig};
use research_scribe::document::{DocumentAssembler, DocxWriter, Outline};
use research_scribe::fetch::UrlResolver;
use research_scribe::llm::{MockGenerator, Unconfigured};
use research_scribe::mcp::server::McpServer;
use research_scribe::models::{FailureKind, FormatMetadata, JournalProfile, SummaryResult};
use research_scribe::pipeline::ResearchPipeline;
use research_scribe::sources::mock::make_record;
use research_scribe::sources::{MockSource, SemanticScholarSource};
use research_scribe::utils::{HttpClient, PdfTextExtractor};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A small PDF with one line of Courier text per page
fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(18)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn client() -> HttpClient {
    HttpClient::with_timeout(Duration::from_secs(5)).unwrap()
}

fn document_xml(path: &Path) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

const SUMMARY_REPLY: &str = r#"{"problem": "P", "methodology": "M", "results": "R", "conclusion": "C"}"#;

#[tokio::test]
async fn test_search_without_model_falls_back_to_lowercased_query() {
    let mut server = mockito::Server::new_async().await;
    let papers: Vec<String> = (0..12)
        .map(|i| {
            let abstract_field = if i % 4 == 3 { "null".to_string() } else { format!("\"Abstract {}\"", i) };
            format!(
                r#"{{"title": "Paper {}", "authors": [{{"name": "Author {}"}}], "year": 2020,
                    "url": "https://s2/{}", "abstract": {}, "citationCount": {}, "journal": null}}"#,
                i, i, i, abstract_field, i
            )
        })
        .collect();
    let mock = server
        .mock("GET", "/paper/search")
        .match_query(mockito::Matcher::UrlEncoded(
            "query".into(),
            "história da computação quântica".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"total": 12, "data": [{}]}}"#, papers.join(",")))
        .create_async()
        .await;

    let source = SemanticScholarSource::new(client()).with_endpoint(server.url());
    let pipeline = ResearchPipeline::builder(Arc::new(Unconfigured), Arc::new(source))
        .build()
        .unwrap();

    let records = pipeline.search("História da Computação Quântica").await.unwrap();

    assert!(records.len() <= 10);
    assert!(!records.is_empty());
    assert!(records.iter().all(|r| !r.r#abstract.trim().is_empty()));
    assert!(records.iter().all(|r| r.journal == "N/A"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_summarize_pdf_behind_landing_page() {
    let mut server = mockito::Server::new_async().await;
    let _landing = server
        .mock("GET", "/articles/42")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(r#"<html><body><a href="full.pdf">Download PDF</a></body></html>"#)
        .create_async()
        .await;
    let _pdf = server
        .mock("GET", "/articles/full.pdf")
        .with_status(200)
        .with_header("content-type", "application/pdf")
        .with_body(pdf_with_pages(&["Quantum error correction", "Surface codes work"]))
        .create_async()
        .await;

    let temp = tempfile::tempdir().unwrap();
    let generator = Arc::new(MockGenerator::with_replies([SUMMARY_REPLY]));
    let pipeline = ResearchPipeline::builder(generator.clone(), Arc::new(MockSource::new()))
        .resolver(UrlResolver::new(client()))
        .extractor(PdfTextExtractor::default().with_temp_dir(temp.path()))
        .build()
        .unwrap();

    let result = pipeline
        .summarize(&format!("{}/articles/42", server.url()), true)
        .await;

    let summary = result.summary().expect("summary");
    assert_eq!(summary.problem, "P");
    assert_eq!(summary.conclusion, "C");
    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("Quantum error correction"));
    assert!(prompt.contains("Surface codes work"));
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_summarize_unreachable_document_is_a_transport_failure() {
    let mut server = mockito::Server::new_async().await;
    let _missing = server
        .mock("GET", "/gone.pdf")
        .with_status(404)
        .create_async()
        .await;

    let generator = Arc::new(MockGenerator::new());
    let pipeline = ResearchPipeline::builder(generator.clone(), Arc::new(MockSource::new()))
        .resolver(UrlResolver::new(client()))
        .build()
        .unwrap();

    let result = pipeline.summarize(&format!("{}/gone.pdf", server.url()), true).await;

    let failure = result.failure_info().expect("failure");
    assert_eq!(failure.kind, FailureKind::Transport);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_summarize_retries_once_after_a_bad_reply() {
    let generator = Arc::new(MockGenerator::with_replies(["Sure! Here it is:", SUMMARY_REPLY]));
    let pipeline = ResearchPipeline::builder(generator.clone(), Arc::new(MockSource::new()))
        .build()
        .unwrap();

    let result = pipeline.summarize("An article about graphs.", false).await;

    assert!(result.is_success());
    assert_eq!(generator.call_count(), 2);
}

#[tokio::test]
async fn test_summarize_reports_contract_violation_after_two_bad_replies() {
    let generator = Arc::new(MockGenerator::with_replies(["nope", "still nope"]));
    let pipeline = ResearchPipeline::builder(generator.clone(), Arc::new(MockSource::new()))
        .build()
        .unwrap();

    let result = pipeline.summarize("An article about graphs.", false).await;

    match result {
        SummaryResult::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::ContractViolation);
            assert_eq!(failure.raw.as_deref(), Some("still nope"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(generator.call_count(), 2);
}

#[tokio::test]
async fn test_format_then_assemble_with_builtin_writer() {
    let reply = r#"{
        "title": "Computação quântica: uma revisão",
        "authors": [{"name": "Ada Lovelace", "affiliation": "Analytical Engines Ltd"}],
        "abstract": "Revisamos o estado da arte.",
        "keywords": ["quântica", "revisão"],
        "sections": [
            {"name": "Introdução", "content": "Primeiro parágrafo.\n\nSegundo parágrafo."},
            {"name": "Conclusão", "content": "Fim."}
        ],
        "references_raw": [{"raw": "LOVELACE, A. Notes. 1843."}]
    }"#;
    let generator = Arc::new(MockGenerator::with_replies([reply]));
    let pipeline = ResearchPipeline::builder(generator, Arc::new(MockSource::new()))
        .assembler(DocumentAssembler::new(vec![Arc::new(DocxWriter::new())]))
        .build()
        .unwrap();

    let profile = JournalProfile::default();
    let metadata = FormatMetadata {
        title_hint: Some("Computação quântica".into()),
        ..Default::default()
    };
    let document = pipeline
        .format_academic("rascunho do artigo", &profile, &metadata)
        .await
        .unwrap();

    assert_eq!(document.sections.len(), 2);
    assert_eq!(document.generation_info.model.as_deref(), Some("mock-model"));

    let dir = tempfile::tempdir().unwrap();
    let path = pipeline
        .assemble_document(&document, &dir.path().join("out/review.docx"))
        .await
        .unwrap();

    assert!(path.is_absolute());
    assert!(path.exists());
    let xml = document_xml(&path);
    let outline = Outline::from_document(&document);
    let mut cursor = 0;
    for heading in outline.headings() {
        let found = xml[cursor..].find(heading).expect("heading in order");
        cursor += found + heading.len();
    }
    assert!(xml.contains("Ada Lovelace (Analytical Engines Ltd)"));
}

#[tokio::test]
async fn test_pipeline_and_server_from_default_config() {
    let mut config = Config::default();
    config.api_keys.gemini = None;
    config.downloads = DownloadConfig {
        timeout_secs: 3,
        ..Default::default()
    };

    let pipeline = ResearchPipeline::from_config(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let server = McpServer::new(Arc::new(pipeline), dir.path().to_path_buf());

    assert!(server.is_ok());
}

#[tokio::test]
async fn test_search_records_come_from_source_unchanged() {
    let source = Arc::new(MockSource::new());
    let record = make_record("Shor's algorithm", "Factoring in polynomial time.");
    source.set_search_response(vec![record.clone()]);
    let generator = Arc::new(MockGenerator::with_replies([r#"{"keywords": "shor factoring"}"#]));
    let pipeline = ResearchPipeline::builder(generator, source.clone()).build().unwrap();

    let records = pipeline.search("how does Shor factor numbers?").await.unwrap();

    assert_eq!(records, vec![record]);
    assert_eq!(source.queries(), vec!["shor factoring"]);
}
