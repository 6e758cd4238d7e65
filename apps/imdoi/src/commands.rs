//! Subcommand handlers
//!
//! Handlers write to a caller-supplied writer so they can be driven from
//! tests; `main` passes stdout.

use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use impress_doi::{
    normalize_manual_input, title_or_placeholder, AttemptOutcome, ConfigError, CrossrefClient,
    DispatchError, DoiResolver, History, HistoryError, HtmlPage, Identifier, ImdoiConfig,
    LinkBuilder, LinkDispatcher, LinkError, ManualInputError, MetadataError, ResolutionTrace,
    ResolveError, SourceLink, WriterOpener,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Input(#[from] ManualInputError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No history location; set history.path in the config")]
    NoHistoryPath,
}

/// Settings shared by every subcommand
pub struct Context {
    pub config: ImdoiConfig,
    pub json: bool,
}

impl Context {
    pub fn load(path: Option<&Path>, json: bool) -> Result<Self, CliError> {
        let config = match path.map(Path::to_path_buf).or_else(ImdoiConfig::default_path) {
            Some(path) => ImdoiConfig::load(&path)?,
            None => ImdoiConfig::default(),
        };
        Ok(Self { config, json })
    }

    fn link_builder(&self) -> LinkBuilder {
        LinkBuilder::new(self.config.sources.clone())
    }
}

fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Page markup from a file, or stdin when no file is given
pub fn read_markup(file: Option<&Path>) -> Result<String, CliError> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut markup = String::new();
            std::io::stdin().read_to_string(&mut markup)?;
            Ok(markup)
        }
    }
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    #[serde(flatten)]
    trace: &'a ResolutionTrace,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

fn describe(outcome: &AttemptOutcome) -> String {
    match outcome {
        AttemptOutcome::Skipped => "skipped (other host)".to_string(),
        AttemptOutcome::NoCandidate => "no candidate".to_string(),
        AttemptOutcome::Rejected { candidates } => format!("rejected: {}", candidates.join(", ")),
        AttemptOutcome::Ambiguous { values } => format!("ambiguous: {}", values.join(", ")),
        AttemptOutcome::Matched {
            identifier,
            conflicting,
        } if conflicting.is_empty() => format!("matched {}", identifier),
        AttemptOutcome::Matched {
            identifier,
            conflicting,
        } => format!("matched {} (ignored {})", identifier, conflicting.join(", ")),
    }
}

/// Resolve a page. Returns whether a DOI was found.
pub fn resolve(
    ctx: &Context,
    out: &mut dyn Write,
    url: &str,
    markup: String,
    explain: bool,
    source: Option<&str>,
) -> Result<bool, CliError> {
    let page = HtmlPage::parse(url, markup);
    let trace = DoiResolver::new().explain_page(&page)?;

    let link = match (&trace.resolution, source) {
        (Some(resolution), Some(key)) => {
            Some(ctx.link_builder().build(key, &resolution.doi)?.to_string())
        }
        _ => None,
    };

    if ctx.json {
        write_json(
            out,
            &ResolveOutput {
                trace: &trace,
                link,
            },
        )?;
        return Ok(trace.resolution.is_some());
    }

    if explain {
        for attempt in &trace.attempts {
            writeln!(out, "{:<16} {}", attempt.strategy, describe(&attempt.outcome))?;
        }
    }
    match &trace.resolution {
        Some(resolution) => {
            writeln!(out, "DOI: {}", resolution.doi)?;
            writeln!(out, "Strategy: {}", resolution.source_strategy)?;
            if let Some(link) = link {
                writeln!(out, "{}", link)?;
            }
        }
        None => writeln!(out, "No DOI detected.")?,
    }
    Ok(trace.resolution.is_some())
}

pub fn normalize(ctx: &Context, out: &mut dyn Write, input: &str) -> Result<(), CliError> {
    let identifier = normalize_manual_input(input)?;
    if ctx.json {
        write_json(out, &identifier)?;
    } else {
        writeln!(out, "{}", identifier)?;
    }
    Ok(())
}

pub fn link(
    ctx: &Context,
    out: &mut dyn Write,
    input: &str,
    source: Option<&str>,
    all: bool,
) -> Result<(), CliError> {
    let identifier = normalize_manual_input(input)?;

    if all {
        let links = ctx.link_builder().links(&identifier)?;
        return write_links(ctx, out, &links);
    }

    if ctx.json {
        let builder = ctx.link_builder();
        let key = source.unwrap_or(builder.config().default_source.as_str());
        let url = builder.build(key, &identifier)?;
        return write_json(out, &serde_json::json!({ "source": key, "url": url.as_str() }));
    }

    let dispatcher = LinkDispatcher::new(ctx.config.sources.clone(), WriterOpener::new(out));
    match source {
        Some(key) => dispatcher.dispatch(key, &identifier)?,
        None => dispatcher.dispatch_default(&identifier)?,
    };
    Ok(())
}

fn write_links(ctx: &Context, out: &mut dyn Write, links: &[SourceLink]) -> Result<(), CliError> {
    if ctx.json {
        return write_json(out, &links);
    }
    for link in links {
        writeln!(out, "{:<16} {}", link.display_name, link.url)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct LookupOutput<'a> {
    identifier: &'a Identifier,
    links: &'a [SourceLink],
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

async fn fetch_title(ctx: &Context, identifier: &Identifier) -> Result<String, MetadataError> {
    let client = CrossrefClient::new(&ctx.config.metadata)?;
    client.fetch_title(identifier).await
}

/// Title to show and title to record. A failed fetch shows the display
/// placeholder but records the history placeholder.
fn lookup_titles(
    ctx: &Context,
    fetched: Option<Result<String, MetadataError>>,
) -> (Option<String>, String) {
    match fetched {
        Some(Ok(title)) => (Some(title.clone()), title),
        Some(Err(e)) => (
            Some(title_or_placeholder(
                Err(e),
                &ctx.config.metadata.placeholder_title,
            )),
            ctx.config.history.unknown_title.clone(),
        ),
        None => (None, ctx.config.history.unknown_title.clone()),
    }
}

/// Normalize, print links, then fetch the title and record the lookup.
/// Links are written and flushed before the fetch starts.
pub async fn lookup(
    ctx: &Context,
    out: &mut dyn Write,
    input: &str,
    with_title: bool,
    today: NaiveDate,
) -> Result<(), CliError> {
    let identifier = normalize_manual_input(input)?;
    let links = ctx.link_builder().links(&identifier)?;

    if !ctx.json {
        writeln!(out, "{}", identifier)?;
        write_links(ctx, out, &links)?;
        out.flush()?;
    }

    let fetched = if with_title && ctx.config.metadata.enabled {
        Some(fetch_title(ctx, &identifier).await)
    } else {
        None
    };
    let (title, recorded_title) = lookup_titles(ctx, fetched);

    if ctx.json {
        write_json(
            out,
            &LookupOutput {
                identifier: &identifier,
                links: &links,
                title: title.as_deref(),
            },
        )?;
    } else if let Some(title) = &title {
        writeln!(out, "Title: {}", title)?;
    }

    match ctx.config.history.resolved_path() {
        Some(path) => {
            let mut history = History::load(&path, ctx.config.history.max_entries)?;
            history.record(identifier, recorded_title, today);
            history.save(&path)?;
        }
        None => tracing::warn!("No history location, lookup not recorded"),
    }
    Ok(())
}

pub fn history(ctx: &Context, out: &mut dyn Write, clear: bool) -> Result<(), CliError> {
    let path = ctx
        .config
        .history
        .resolved_path()
        .ok_or(CliError::NoHistoryPath)?;
    let mut history = History::load(&path, ctx.config.history.max_entries)?;

    if clear {
        history.clear();
        history.save(&path)?;
        if !ctx.json {
            writeln!(out, "History cleared.")?;
        }
        return Ok(());
    }

    if ctx.json {
        return write_json(out, &history.entries());
    }
    if history.is_empty() {
        writeln!(out, "No recent lookups.")?;
    }
    for entry in history.entries() {
        writeln!(out, "{}  {:<32} {}", entry.date, entry.doi, entry.title)?;
    }
    Ok(())
}

#[derive(Serialize)]
struct SourceRow<'a> {
    key: &'a str,
    display_name: &'a str,
    template: String,
    default: bool,
}

pub fn sources(ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
    let config = &ctx.config.sources;
    let rows: Vec<SourceRow<'_>> = config
        .keys()
        .into_iter()
        .filter_map(|key| {
            config.get(key).map(|template| SourceRow {
                key,
                display_name: &template.display_name,
                template: format!("{}{{id}}{}", template.prefix, template.suffix),
                default: key == config.default_source,
            })
        })
        .collect();

    if ctx.json {
        return write_json(out, &rows);
    }
    for row in &rows {
        let marker = if row.default { "*" } else { " " };
        writeln!(
            out,
            "{} {:<14} {:<16} {}",
            marker, row.key, row.display_name, row.template
        )?;
    }
    Ok(())
}
