use std::fs;
use tempfile::TempDir;

use docqa_core::chunker::{Chunker, ChunkingConfig};
use docqa_core::config::Config;
use docqa_core::data_processor::DataProcessor;
use docqa_core::error::Error;
use docqa_core::types::{Document, IngestionFailure, IngestionSummary};

fn chunker(size: usize, overlap: usize) -> Chunker {
    Chunker::new(ChunkingConfig::new(size, overlap).expect("config")).expect("chunker")
}

fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
}

#[test]
fn scenario_two_chunks_with_single_word_overlap() {
    let doc = Document {
        name: "ai.txt".into(),
        path: "ai.txt".into(),
        text: "AI is the simulation of human intelligence in machines.".into(),
    };
    let chunks = chunker(6, 1).chunk_document(&doc);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, "AI is the simulation of human");
    assert_eq!(chunks[1].text, "human intelligence in machines.");
    assert_eq!(chunks[1].id(), "ai.txt:1");
}

#[test]
fn chunk_count_and_reconstruction_hold_across_sizes() {
    for (size, overlap) in [(1, 0), (3, 1), (5, 0), (6, 1), (10, 9), (7, 3)] {
        let c = chunker(size, overlap);
        for len in 0..40 {
            let text = words(len);
            let chunks: Vec<String> = c.windows(&text).collect();
            let expected = if len == 0 {
                0
            } else if len <= size {
                1
            } else {
                (len - overlap).div_ceil(size - overlap)
            };
            assert_eq!(chunks.len(), expected, "L={} S={} O={}", len, size, overlap);

            let mut rebuilt: Vec<&str> = Vec::new();
            for (i, chunk) in chunks.iter().enumerate() {
                let chunk_words: Vec<&str> = chunk.split(' ').collect();
                assert!(chunk_words.len() <= size);
                let skip = if i == 0 { 0 } else { overlap };
                rebuilt.extend(chunk_words.into_iter().skip(skip));
            }
            let original: Vec<&str> = text.split_whitespace().collect();
            assert_eq!(rebuilt, original, "L={} S={} O={}", len, size, overlap);
        }
    }
}

#[test]
fn whitespace_only_text_has_no_chunks() {
    assert_eq!(chunker(4, 1).windows(" \n\t ").count(), 0);
}

#[test]
fn list_documents_filters_and_sorts() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("b.txt"), "bravo").unwrap();
    fs::write(dir.join("a.md"), "alpha").unwrap();
    fs::write(dir.join("nested/c.TXT"), "charlie").unwrap();
    fs::write(dir.join("image.png"), [0u8, 1, 2]).unwrap();

    let processor = DataProcessor::new();
    let files = processor.list_documents(dir);
    let names: Vec<String> = files.iter().map(|p| docqa_core::data_processor::document_name(p, dir)).collect();
    assert_eq!(names, vec!["a.md", "b.txt", "nested/c.TXT"]);
}

#[test]
fn load_reports_corrupt_pdf_and_empty_text() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("broken.pdf"), b"this is not a pdf").unwrap();
    fs::write(dir.join("empty.txt"), "   \n").unwrap();
    fs::write(dir.join("ok.txt"), "Short text").unwrap();

    let processor = DataProcessor::new();
    assert!(matches!(processor.load(&dir.join("broken.pdf"), dir), Err(Error::Document(_))));
    assert!(matches!(processor.load(&dir.join("empty.txt"), dir), Err(Error::Document(_))));
    let doc = processor.load(&dir.join("ok.txt"), dir).expect("load");
    assert_eq!(doc.name, "ok.txt");
    assert_eq!(doc.text, "Short text");
}

#[test]
fn summary_with_failures_is_partial_failure() {
    let summary = IngestionSummary {
        documents_processed: 2,
        chunks_created: 5,
        failures: vec![IngestionFailure { document: "bad.pdf".into(), reason: "malformed".into() }],
    };
    match summary.ensure_complete() {
        Err(Error::IngestionPartialFailure { failed, total }) => {
            assert_eq!(failed, 1);
            assert_eq!(total, 3);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(IngestionSummary::default().ensure_complete().is_ok());
}

#[test]
fn config_layers_toml_and_env() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "dev");
        jail.create_file(
            "config.toml",
            r#"
            [data]
            index_dir = "/tmp/docqa-index"

            [chunking]
            chunk_size = 120
            overlap = 20
            "#,
        )?;
        jail.create_file("config.dev.toml", "[retrieval]\ntop_k = 4\n")?;
        jail.set_env("APP_RETRIEVAL__MIN_SCORE", "0.25");
        jail.set_env("GEMINI_API_KEY", "key-from-env");

        let loaded = Config::load().map_err(|e| e.to_string())?;
        assert_eq!(loaded.env_name(), "dev");
        assert_eq!(loaded.get::<usize>("chunking.chunk_size").map_err(|e| e.to_string())?, 120);
        let app = loaded.app().map_err(|e| e.to_string())?;
        assert_eq!(app.data.index_dir, "/tmp/docqa-index");
        assert_eq!(app.data.table, "pdf_knowledge");
        assert_eq!(app.chunking, ChunkingConfig { chunk_size: 120, overlap: 20 });
        assert_eq!(app.retrieval.top_k, 4);
        assert_eq!(app.retrieval.min_score, Some(0.25));
        assert_eq!(app.generation.api_key.as_deref(), Some("key-from-env"));
        Ok(())
    });
}

#[test]
fn config_rejects_invalid_chunking_and_missing_prod_key() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "dev");
        jail.create_file("config.toml", "[chunking]\nchunk_size = 10\noverlap = 10\n")?;
        let err = Config::load().map_err(|e| e.to_string())?.app();
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
        Ok(())
    });

    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "prod");
        jail.set_env("APP_GENERATION__API_KEY", "");
        let err = Config::load().map_err(|e| e.to_string())?.app();
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
        Ok(())
    });
}
