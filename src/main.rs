use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use tokio::time::sleep;

use insightwatch::client::{HttpReportClient, ReportApi, SharedApi};
use insightwatch::config::Config;
use insightwatch::logging::{json_log, obj, v_str, Domain};
use insightwatch::model::{ReportDepth, ReportDraft, Section};
use insightwatch::view::{DetailScreen, ListRow, ReportDetailView, ReportListView};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("list");

    json_log(
        Domain::System,
        "startup",
        obj(&[("base_url", v_str(&cfg.base_url)), ("command", v_str(command))]),
    );

    let api: SharedApi = Arc::new(HttpReportClient::new(&cfg)?);

    match command {
        "list" => watch_list(api, &cfg).await,
        "watch" => {
            let id = parse_id(args.get(2))?;
            watch_report(api, &cfg, id).await
        }
        "create" => create_report(api, &args[2..]).await,
        "regen" => {
            let id = parse_id(args.get(2))?;
            let name = args.get(3).ok_or_else(|| anyhow!("usage: regen <id> <section>"))?;
            let section = Section::parse(name)
                .ok_or_else(|| anyhow!("unknown section: {} (expected one of: {})", name, section_names()))?;
            regen_section(api, &cfg, id, section).await
        }
        "pdf" => {
            let id = parse_id(args.get(2))?;
            let path = args.get(3).cloned().unwrap_or_else(|| format!("report_{}.pdf", id));
            download_pdf(api, id, &path).await
        }
        other => Err(anyhow!("unknown command: {} (expected list|watch|create|regen|pdf)", other)),
    }
}

fn parse_id(arg: Option<&String>) -> Result<i64> {
    let raw = arg.ok_or_else(|| anyhow!("missing report id"))?;
    let id: i64 = raw.parse().with_context(|| format!("invalid report id: {}", raw))?;
    if id <= 0 {
        return Err(anyhow!("report id must be positive: {}", id));
    }
    Ok(id)
}

fn section_names() -> String {
    Section::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
}

/// Live roster: re-render whenever a poll tick lands.
async fn watch_list(api: SharedApi, cfg: &Config) -> Result<()> {
    let mut view = ReportListView::new(api, Duration::from_secs(cfg.poll_interval_secs));
    view.open();

    let mut rendered_tick = 0;
    loop {
        sleep(Duration::from_millis(250)).await;
        let tick = view.ticks();
        if tick != rendered_tick {
            rendered_tick = tick;
            render_list(&view.rows());
        }
    }
}

fn render_list(rows: &[ListRow]) {
    println!();
    if rows.is_empty() {
        println!("No reports yet.");
        return;
    }
    println!("{:<5} {:<28} {:<14} {:<10} {:<17} PROGRESS", "ID", "INDUSTRY", "GEOGRAPHY", "STATUS", "CREATED");
    for row in rows {
        println!(
            "{:<5} {:<28} {:<14} {:<10} {:<17} {}",
            row.id, row.industry, row.geography, row.status_badge, row.created, row.progress
        );
    }
}

/// Live detail screen for one report.
async fn watch_report(api: SharedApi, cfg: &Config, id: i64) -> Result<()> {
    let mut view = ReportDetailView::new(api, Duration::from_secs(cfg.poll_interval_secs), id);
    view.open();

    let mut rendered_tick = 0;
    loop {
        sleep(Duration::from_millis(250)).await;
        let tick = view.ticks();
        if tick != rendered_tick {
            rendered_tick = tick;
            match view.screen() {
                Some(screen) => render_detail(&screen),
                None => println!("Loading..."),
            }
        }
    }
}

fn render_detail(screen: &DetailScreen) {
    println!();
    println!("== {} ==", screen.title);
    println!("{}", screen.subtitle);
    println!("{}", screen.status_line);

    for card in &screen.metrics {
        println!("  {:<22} {}", card.label, card.value);
    }

    if let Some(trend) = &screen.trend {
        println!("-- Historical to Forecast Market Size --");
        for p in &trend.points {
            println!("  {}: {}B  (x={:.1}, y={:.1})", p.year, p.value, p.x, p.y);
        }
    }

    if !screen.type_bars.is_empty() {
        println!("-- Market Size Breakup by Type --");
        for bar in &screen.type_bars {
            println!("  {:<24} {:>5}%  {}", bar.label, bar.share_percent, bar.color);
        }
    }

    if !screen.player_donut.is_empty() {
        println!("-- Player Market Share Mix --");
        for seg in &screen.player_donut {
            println!(
                "  {:<24} {:>5}%  [{} .. {}]  {}",
                seg.label, seg.share_percent, seg.start_percent, seg.end_percent, seg.color
            );
        }
    }

    if !screen.regional_bars.is_empty() {
        println!("-- Regional / Country Overview by Share --");
        for bar in &screen.regional_bars {
            println!("  {:<24} {:>5}%  {}", bar.label, bar.share_percent, bar.color);
        }
        for line in &screen.regional_commentary {
            println!("  {}", line);
        }
    }

    for panel in &screen.panels {
        println!("-- {} --", panel.title);
        for item in &panel.items {
            println!("  * {}", item);
        }
    }

    if !screen.player_profiles.is_empty() {
        println!("-- Key Player Profiles --");
        for line in &screen.player_profiles {
            println!("  {}", line);
        }
    }

    println!("-- Full Narrative Report --");
    println!("{}", screen.narrative);
}

/// Submit a creation request: create <industry> <geography> <horizon> [depth].
/// Omitted fields fall back to the demo draft.
async fn create_report(api: SharedApi, args: &[String]) -> Result<()> {
    let mut draft = ReportDraft::default();
    if let Some(industry) = args.first() {
        draft.industry = industry.clone();
    }
    if let Some(geography) = args.get(1) {
        draft.geography = geography.clone();
    }
    if let Some(horizon) = args.get(2) {
        draft.time_horizon = horizon.clone();
    }
    if let Some(depth) = args.get(3) {
        draft.depth = match depth.as_str() {
            "Basic" => ReportDepth::Basic,
            "Professional" => ReportDepth::Professional,
            "Investor-grade" => ReportDepth::InvestorGrade,
            other => return Err(anyhow!("unknown depth: {}", other)),
        };
    }

    let ack = api.create_report(&draft).await?;
    json_log(
        Domain::System,
        "report_created",
        obj(&[("id", serde_json::json!(ack.id)), ("industry", v_str(&draft.industry))]),
    );
    println!("Created report {} ({})", ack.id, draft.industry);
    Ok(())
}

/// One-shot regenerate: send the command, force a re-fetch, report the
/// refreshed status, exit.
async fn regen_section(api: SharedApi, cfg: &Config, id: i64, section: Section) -> Result<()> {
    let mut view = ReportDetailView::new(api, Duration::from_secs(cfg.poll_interval_secs), id);
    view.open();
    view.select_section(section);

    // Let the initial fetch land so the refresh below is observable as the
    // regenerate-triggered one.
    sleep(Duration::from_millis(300)).await;

    let ack = view.regenerate_selected().await?;
    println!("Regeneration accepted for report {}: {}", ack.id, ack.message);

    sleep(Duration::from_millis(500)).await;
    if let Some(screen) = view.screen() {
        println!("{}", screen.status_line);
    }
    view.close();
    Ok(())
}

async fn download_pdf(api: SharedApi, id: i64, path: &str) -> Result<()> {
    let bytes = api.download_pdf(id).await?;
    let digest = hex::encode(Sha256::digest(&bytes));
    std::fs::write(path, &bytes).with_context(|| format!("cannot write {}", path))?;
    json_log(
        Domain::System,
        "pdf_downloaded",
        obj(&[
            ("id", serde_json::json!(id)),
            ("path", v_str(path)),
            ("bytes", serde_json::json!(bytes.len())),
            ("sha256", v_str(&digest)),
        ]),
    );
    println!("Saved {} ({} bytes, sha256 {})", path, bytes.len(), digest);
    Ok(())
}
