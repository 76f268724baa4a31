use std::env;
use std::path::PathBuf;

use docqa_cli::logging;
use docqa_core::config::Config;
use docqa_core::error::Error;
use docqa_core::APOLOGY_MESSAGE;
use docqa_rag::Assistant;

const USAGE: &str = "Usage: docqa <ingest [dir] | query \"<question>\" [--top-k N] | stats | documents | clear>";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{}", USAGE); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

/// Splits `query` arguments into the question and an optional `--top-k N`.
fn parse_query_args(args: &[String]) -> Result<(String, Option<usize>), String> {
    let mut words = Vec::new();
    let mut top_k = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--top-k" | "-k" => {
                let value = args.get(i + 1).ok_or("--top-k requires a number")?;
                top_k = Some(value.parse::<usize>().map_err(|_| format!("--top-k expects a number, got '{}'", value))?);
                i += 1;
            }
            other => words.push(other.to_string()),
        }
        i += 1;
    }
    Ok((words.join(" "), top_k))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("warn");
    let config = Config::load()
        .and_then(|c| c.app())
        .map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let (cmd, args) = parse_args();
    let assistant = Assistant::from_config(&config).await?;

    match cmd.as_str() {
        "ingest" => {
            let dir = args.first().map(PathBuf::from).unwrap_or_else(|| assistant.documents_dir().to_path_buf());
            println!("Ingesting from {}", dir.display());
            let summary = assistant.ingestor.ingest_directory(&dir).await?;
            println!("✅ Processed {} document(s), {} chunk(s)", summary.documents_processed, summary.chunks_created);
            for failure in &summary.failures {
                println!("⚠️  {}: {}", failure.document, failure.reason);
            }
            summary.ensure_complete()?;
        }
        "query" => {
            let (question, top_k) = parse_query_args(&args).unwrap_or_else(|e| {
                eprintln!("Error: {}\n{}", e, USAGE); std::process::exit(1)
            });
            match assistant.query.answer(&question, top_k).await {
                Ok(answer) => {
                    println!("{}", answer.answer);
                    if answer.num_sources > 0 { println!("\n📚 {} source(s)", answer.num_sources); }
                }
                Err(Error::InvalidQuery(msg)) => { eprintln!("Error: {}", msg); std::process::exit(1); }
                Err(e) => {
                    tracing::error!(error = %e, "query failed");
                    eprintln!("{}", APOLOGY_MESSAGE);
                    std::process::exit(1);
                }
            }
        }
        "stats" => {
            let stats = assistant.index.stats().await?;
            println!("📊 {} chunk(s) from {} document(s) in '{}'", stats.total_chunks, stats.total_documents, assistant.index.table_name());
        }
        "documents" => {
            for name in assistant.index.documents().await? { println!("{}", name); }
        }
        "clear" => {
            assistant.index.clear().await?;
            println!("🧹 Index cleared. Run `docqa ingest` to rebuild.");
        }
        _ => { eprintln!("{}", USAGE); std::process::exit(1); }
    }
    Ok(())
}
