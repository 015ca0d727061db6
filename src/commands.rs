use crate::{OutputMode, emit_success};
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use vedabase::config::{self, VedabaseConfig};
use vedabase::corpus;
use vedabase::resolver::Resolver;
use vedabase::ui::{self, Icons, MatchRow, SeedProgressBar, Spinner, banner, block, header, section, status, success, verse_block};
use owo_colors::OwoColorize;

const MAX_TOP: usize = 5;
const MAX_LIMIT: usize = 10;
const FAILURES_SHOWN: usize = 10;

pub fn run_version(output_mode: OutputMode) -> anyhow::Result<()> {
    if output_mode.is_human() {
        banner(
            &format!("{}", "Vedabase".bold().style(ui::theme().info.clone())),
            &format!("Version {}", env!("CARGO_PKG_VERSION").bold())
        );
    } else {
        let data = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        });
        emit_success(output_mode, "version", data)?;
    }
    Ok(())
}

pub fn run_init(config_path: &Path, force: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    config::write_config(config_path, &VedabaseConfig::with_defaults(), force)?;
    if output_mode.is_human() {
        success(&format!("Wrote {}", config_path.display()));
    } else {
        emit_success(output_mode, "init", serde_json::json!({ "config": config_path.display().to_string() }))?;
    }
    Ok(())
}

pub async fn run_lookup(resolver: &Resolver, reference: &str, refresh: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    let spinner = output_mode.is_human().then(|| Spinner::new(&format!("Resolving {}", reference)));
    let result = if refresh {
        let parsed = vedabase::parse_reference(reference)?;
        resolver.refresh_verse(parsed).await
    } else {
        resolver.resolve_reference(reference).await
    };
    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }
    let resolution = result?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "lookup", serde_json::to_value(&resolution)?);
    }

    let record = &resolution.record;
    header(&format!("{} {}", ui::reference(&record.reference.to_string()), ui::dim(&format!("({})", resolution.provenance))));
    if let Some(devanagari) = &record.devanagari {
        verse_block("Sanskrit", devanagari);
    }
    if let Some(transliteration) = &record.transliteration {
        verse_block("Transliteration", transliteration);
    }
    if let Some(synonyms) = record.synonyms() {
        block("Synonyms", synonyms);
    }
    if let Some(translation) = &record.translation {
        block("Translation", translation);
    }
    if let Some(purport) = record.purport() {
        block("Purport", purport);
    }
    println!();
    if resolution.provenance.is_degraded() {
        ui::warn("Vedabase was unreachable; translation is the bulk-source fallback");
    }
    status(Icons::LINK, "Source", &record.source_url);
    Ok(())
}

pub fn run_match(resolver: &Resolver, text: &str, top: usize, output_mode: OutputMode) -> anyhow::Result<()> {
    let candidates = resolver.match_text(text, top.clamp(1, MAX_TOP))?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "match", serde_json::to_value(&candidates)?);
    }

    println!("{} Matching: {}", Icons::SEARCH, ui::dim(text));
    if candidates.is_empty() {
        println!("{} No matches found.", Icons::CROSS);
        return Ok(());
    }

    let rows: Vec<MatchRow> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| MatchRow {
            rank: i + 1,
            reference: c.reference.to_string(),
            score: format!("{:.2}", c.score),
            transliteration: c.transliteration.clone(),
        })
        .collect();
    println!("{}", ui::match_table(&rows));

    if let Some(top) = candidates.first() {
        if let Some(record) = resolver.cache().get(top.reference)? {
            if let Some(translation) = &record.translation {
                block(&format!("Top match translation ({})", record.reference), translation);
            }
        }
    }
    Ok(())
}

pub fn run_search(resolver: &Resolver, query: &str, limit: usize, output_mode: OutputMode) -> anyhow::Result<()> {
    let results = resolver.search(query, limit.clamp(1, MAX_LIMIT))?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "search", serde_json::to_value(&results)?);
    }

    println!("{} Searching for: '{}'...", Icons::SEARCH, query);
    if results.verses.is_empty() {
        println!("{} No verses found.", Icons::CROSS);
    }
    for record in &results.verses {
        println!("- {}", ui::reference(&record.reference.to_string()));
        if let Some(transliteration) = &record.transliteration {
            println!("  {}", ui::muted(transliteration));
        }
        if let Some(translation) = &record.translation {
            println!("  {}", translation);
        }
    }
    if results.is_partial() {
        ui::warn(&format!(
            "Only {}/{} verses cached; run `vedabase seed` for complete results",
            results.cached, results.corpus_size
        ));
    }
    Ok(())
}

pub async fn run_chapter(resolver: &Resolver, number: u32, output_mode: OutputMode) -> anyhow::Result<()> {
    let resolution = resolver.resolve_chapter(number).await?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "chapter", serde_json::to_value(&resolution)?);
    }

    let chapter = &resolution.record;
    header(&format!("Chapter {}: {}", chapter.number, chapter.name.as_deref().unwrap_or("")));
    if let Some(name) = &chapter.name_transliterated {
        status(Icons::BOOK, "Transliteration", name);
    }
    if let Some(meaning) = &chapter.name_meaning {
        status(Icons::BOOK, "Meaning", meaning);
    }
    status(Icons::BOOK, "Verses", &chapter.verses_count.to_string());
    if let Some(summary) = &chapter.summary {
        block("Summary", summary);
    }
    Ok(())
}

pub async fn run_seed(resolver: &Resolver, output_mode: OutputMode) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping after the current verse");
            on_signal.cancel();
        }
    });

    let bar = output_mode.is_human().then(|| SeedProgressBar::new(corpus::corpus_size()));
    let started = Instant::now();
    let report = resolver
        .seed_all_with(&cancel, |progress| {
            if let Some(bar) = &bar {
                bar.update(progress);
            }
        })
        .await?;

    let Some(bar) = bar else {
        return emit_success(output_mode, "seed", serde_json::to_value(&report)?);
    };
    bar.finish_with_summary(started.elapsed(), &report);

    if !report.failures.is_empty() {
        section("Failures");
        for failure in report.failures.iter().take(FAILURES_SHOWN) {
            println!("  {} {}: {}", Icons::CROSS, failure.reference, ui::dim(&failure.reason));
        }
        if report.failures.len() > FAILURES_SHOWN {
            println!("  ... and {} more", report.failures.len() - FAILURES_SHOWN);
        }
        println!();
        ui::info("Re-run", "vedabase seed (cached verses are skipped)");
    }
    Ok(())
}

pub fn run_stats(resolver: &Resolver, db_path: &Path, output_mode: OutputMode) -> anyhow::Result<()> {
    let stats = resolver.stats()?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "stats", serde_json::to_value(&stats)?);
    }

    println!("{} Vedabase Statistics ({})", Icons::STATS, db_path.display());
    let mut rows = vec![
        ("Verses", format!("{}/{}", stats.verses, stats.corpus_size)),
        ("Chapters", format!("{}/{}", stats.chapters, corpus::CHAPTER_COUNT)),
    ];
    for (state, count) in &stats.by_enrichment {
        rows.push((state.as_str(), count.to_string()));
    }
    rows.push(("Complete", if stats.is_complete() { "yes" } else { "no" }.to_string()));
    println!("{}", ui::stats_table(&rows));
    Ok(())
}
