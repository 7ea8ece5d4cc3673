mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use docingest::{DocumentAssembler, IngestOptions, ParseResult, ParsedDocument};
use std::fs;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = cli::Cli::parse();
    logging::init_tracing(cli.verbose);

    let options = cli.apply(IngestOptions::from_env().context("Invalid environment configuration")?);
    let result = DocumentAssembler::new(options).parse(&cli.input);

    if let (Some(path), Some(doc)) = (&cli.cover_out, &result.data) {
        match &doc.cover_image {
            Some(cover) => {
                fs::write(path, &cover.data)
                    .with_context(|| format!("Failed to write cover: {}", path.display()))?;
                tracing::info!(path = %path.display(), bytes = cover.size, "Wrote cover image");
            }
            None => tracing::info!("Document has no cover image"),
        }
    }

    if let Some(ref path) = cli.output {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote result");
    } else if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{json}");
    } else {
        print_summary(&result);
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(result: &ParseResult<ParsedDocument>) {
    let Some(doc) = &result.data else {
        eprintln!(
            "Error: {}",
            result.error.as_deref().unwrap_or("unknown failure")
        );
        return;
    };

    let field = |label: &str, value: &str| {
        if !value.is_empty() {
            println!("{label:<12} {value}");
        }
    };

    field("Format:", doc.format.as_str());
    field("Title:", &doc.metadata.title);
    field("Author:", &doc.metadata.author);
    field("Language:", &doc.metadata.language);
    field("Publisher:", &doc.metadata.publisher);
    field("Published:", &doc.metadata.publication_date);
    field("ISBN:", &doc.metadata.isbn);
    if !doc.metadata.subjects.is_empty() {
        field("Subjects:", &doc.metadata.subjects.join(", "));
    }
    if let Some(pages) = doc.page_count {
        field("Pages:", &pages.to_string());
    }
    field(
        "Words:",
        &format!(
            "{} (~{} min)",
            doc.total_word_count, doc.estimated_reading_time_minutes
        ),
    );
    if let Some(cover) = &doc.cover_image {
        field(
            "Cover:",
            &format!("{} ({}, {} bytes)", cover.filename, cover.mime_type, cover.size),
        );
    }
    field("Hash:", &doc.content_hash);

    if !doc.sections.is_empty() {
        println!("\nSections:");
        for section in &doc.sections {
            let indent = "  ".repeat(section.level + 1);
            println!(
                "{indent}{}. {} ({} words)",
                section.order, section.title, section.word_count
            );
        }
    }

    for message in &doc.messages {
        eprintln!("{:?}: {}", message.kind, message.message);
    }
}
