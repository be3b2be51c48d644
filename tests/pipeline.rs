//! End-to-end tests for the ingestion pipeline and query path.
//!
//! Each test builds a fresh in-memory engine, feeds it in-memory files and
//! checks what a caller observes: reports, callbacks, results.

use std::sync::{Arc, Mutex};

use docseek::config::Config;
use docseek::extract::normalize_text;
use docseek::progress::{CallbackProgress, NoProgress};
use docseek::{FileType, ProcessingStatus, SearchEngine, SearchFilters, SearchQuery, SourceFile};

fn engine() -> SearchEngine {
    SearchEngine::new(&Config::default())
}

fn file(name: &str, body: &[u8]) -> SourceFile {
    SourceFile::from_bytes(name, body.to_vec())
}

/// Minimal valid single-page PDF drawing `phrase`.
fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            content.len(),
            content
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

fn minimal_docx(phrase: &str) -> Vec<u8> {
    use std::io::Write;
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file(
            "word/document.xml",
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>",
            phrase
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

#[tokio::test]
async fn plain_text_round_trips_through_normalization() {
    let engine = engine();
    let raw = "Line one\r\n\r\n\r\n\r\n  Line two  \rLine three\n";
    engine
        .index_files(vec![file("notes.txt", raw.as_bytes())], &NoProgress)
        .await
        .unwrap();

    let docs = engine.store().all_documents();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].text, normalize_text(raw));
    assert_eq!(normalize_text(&docs[0].text), docs[0].text);
    assert_eq!(docs[0].text, "Line one\n\nLine two\nLine three");
}

#[tokio::test]
async fn csv_rows_become_searchable_lines() {
    let engine = engine();
    engine
        .index_files(
            vec![file("people.csv", b"name,age\nJohn,30\nJane,25")],
            &NoProgress,
        )
        .await
        .unwrap();
    let text = &engine.store().all_documents()[0].text;
    assert!(text.contains("name age"));
    assert!(text.contains("John 30"));
    assert!(text.contains("Jane 25"));

    let hits = engine.search_text("jane", None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].metadata.file_type, FileType::Csv);
}

#[tokio::test]
async fn html_is_stripped_of_markup() {
    let engine = engine();
    engine
        .index_files(
            vec![file(
                "page.html",
                b"<html><body><h1>Title</h1><p>Content</p></body></html>",
            )],
            &NoProgress,
        )
        .await
        .unwrap();
    let text = &engine.store().all_documents()[0].text;
    assert!(text.contains("Title"));
    assert!(text.contains("Content"));
    assert!(!text.contains("<h1>"));
}

#[tokio::test]
async fn unsupported_type_is_skipped_without_stopping_the_batch() {
    let engine = engine();
    let report = engine
        .index_files(
            vec![
                file("before.txt", b"first file"),
                file("mystery.xyz", b"opaque bytes"),
                file("after.md", b"last file"),
            ],
            &NoProgress,
        )
        .await
        .unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(engine.file_count(), 2);
    assert_eq!(engine.errors().len(), 1);
    assert_eq!(engine.errors()[0].name, "mystery.xyz");
    assert!(engine.search_text("opaque", None).unwrap().is_empty());
    assert_eq!(engine.search_text("file", None).unwrap().len(), 2);
}

#[tokio::test]
async fn corrupt_pdf_fails_alone() {
    let engine = engine();
    let progress = Arc::new(Mutex::new(Vec::new()));
    let errors = Arc::new(Mutex::new(Vec::new()));
    let (p, e) = (Arc::clone(&progress), Arc::clone(&errors));
    let reporter = CallbackProgress::new()
        .on_progress(move |current, total| p.lock().unwrap().push((current, total)))
        .on_error(move |msg| e.lock().unwrap().push(msg.to_string()));

    let files = vec![
        file("one.txt", b"alpha report"),
        file("two.docx", &minimal_docx("beta report")),
        file("three.pdf", b"not a pdf"),
        file("four.pdf", &minimal_pdf("gamma report")),
        file("five.csv", b"label,value\ndelta report,5"),
    ];
    let report = engine.index_files(files, &reporter).await.unwrap();

    assert_eq!(report.total, 5);
    assert_eq!(report.indexed, 4);
    assert_eq!(report.failed, 1);

    assert_eq!(
        *progress.lock().unwrap(),
        vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]
    );
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0].starts_with("three.pdf: PDF extraction failed:"),
        "got {}",
        errors[0]
    );

    let mut names: Vec<String> = engine
        .search_text("report", None)
        .unwrap()
        .into_iter()
        .map(|r| r.metadata.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["five.csv", "four.pdf", "one.txt", "two.docx"]);
    assert_eq!(engine.status(), ProcessingStatus::Complete);
}

#[tokio::test]
async fn fuzzy_query_finds_misspelling() {
    let engine = engine();
    engine
        .index_files(
            vec![
                file("lang.txt", b"Rust is a systems programming language"),
                file("other.txt", b"gardening tips for spring"),
            ],
            &NoProgress,
        )
        .await
        .unwrap();
    let hits = engine.search_text("programing", None).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].metadata.name, "lang.txt");
    assert!(hits[0].score > 0.0);
}

#[tokio::test]
async fn prefix_query_matches_partial_term() {
    let engine = engine();
    engine
        .index_files(vec![file("k8s.md", b"Kubernetes deployment guide")], &NoProgress)
        .await
        .unwrap();
    assert_eq!(engine.search_text("kuber", None).unwrap().len(), 1);
    assert_eq!(engine.search_text("deploy", None).unwrap().len(), 1);
}

#[tokio::test]
async fn empty_queries_return_nothing() {
    let engine = engine();
    for text in ["", "   "] {
        assert!(engine.search_text(text, None).unwrap().is_empty());
    }
    engine
        .index_files(vec![file("a.txt", b"anything at all")], &NoProgress)
        .await
        .unwrap();
    for text in ["", "   "] {
        assert!(engine.search_text(text, None).unwrap().is_empty());
    }
}

#[tokio::test]
async fn limit_keeps_the_highest_ranked() {
    let engine = engine();
    let files: Vec<SourceFile> = (0..30)
        .map(|i| {
            let body = format!("test {}", "padding ".repeat(1 + (i * 7) % 30));
            file(&format!("doc{:02}.txt", i), body.as_bytes())
        })
        .collect();
    engine.index_files(files, &NoProgress).await.unwrap();

    let all = engine.search_text("test", Some(100)).unwrap();
    assert_eq!(all.len(), 30);
    let top = engine.search_text("test", Some(5)).unwrap();
    assert_eq!(top.len(), 5);

    let expected: Vec<&str> = all[..5].iter().map(|r| r.file_id.as_str()).collect();
    let got: Vec<&str> = top.iter().map(|r| r.file_id.as_str()).collect();
    assert_eq!(got, expected);
    let weakest_top = top.iter().map(|r| r.score).fold(f64::INFINITY, f64::min);
    assert!(all[5..].iter().all(|r| r.score <= weakest_top));
}

#[tokio::test]
async fn concurrent_ingestion_indexes_everything() {
    let mut config = Config::default();
    config.ingest.concurrency = 4;
    let engine = SearchEngine::new(&config);
    let progress = Arc::new(Mutex::new(Vec::new()));
    let p = Arc::clone(&progress);
    let reporter = CallbackProgress::new().on_progress(move |c, _| p.lock().unwrap().push(c));

    let files: Vec<SourceFile> = (0..12)
        .map(|i| file(&format!("f{}.txt", i), format!("shared item{}", i).as_bytes()))
        .collect();
    let report = engine.index_files(files, &reporter).await.unwrap();

    assert_eq!(report.indexed, 12);
    assert_eq!(engine.search_text("shared", Some(50)).unwrap().len(), 12);
    assert_eq!(*progress.lock().unwrap(), (1..=12).collect::<Vec<_>>());
}

#[tokio::test]
async fn filters_narrow_results() {
    let engine = engine();
    engine
        .index_files(
            vec![
                file("budget.csv", b"item,cost\nbudget,10").with_relative_path("finance/budget.csv"),
                file("budget.md", b"# Budget notes").with_relative_path("notes/budget.md"),
            ],
            &NoProgress,
        )
        .await
        .unwrap();

    let by_type = engine
        .search(&SearchQuery::new("budget").with_filters(SearchFilters {
            file_types: Some(vec![FileType::Md]),
            ..Default::default()
        }))
        .unwrap();
    assert_eq!(by_type.len(), 1);
    assert_eq!(by_type[0].metadata.path, "notes/budget.md");

    let by_path = engine
        .search(&SearchQuery::new("budget").with_filters(SearchFilters {
            paths: Some(vec!["finance/".to_string()]),
            ..Default::default()
        }))
        .unwrap();
    assert_eq!(by_path.len(), 1);
    assert_eq!(by_path[0].metadata.name, "budget.csv");
}

#[tokio::test]
async fn results_carry_metadata_and_snippets() {
    let engine = engine();
    let body = "The quarterly revenue grew by twelve percent while costs fell.";
    engine
        .index_files(
            vec![file("q3.txt", body.as_bytes()).with_relative_path("reports/q3.txt")],
            &NoProgress,
        )
        .await
        .unwrap();

    let hits = engine.search_text("revenue costs", None).unwrap();
    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.metadata.path, "reports/q3.txt");
    assert_eq!(hit.metadata.size, body.len() as u64);
    assert_eq!(hit.metadata.hash.len(), 64);
    assert_eq!(hit.snippets.len(), 2);
    for snippet in &hit.snippets {
        assert_eq!(snippet.highlights.len(), 1);
        let (start, end) = snippet.highlights[0];
        let highlighted: String = snippet.text.chars().skip(start).take(end - start).collect();
        assert!(["revenue", "costs"].contains(&highlighted.to_lowercase().as_str()));
    }
}
