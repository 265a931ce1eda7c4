//! Tower Bridge lift times (HTML page with a pager).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::client::get_body;
use super::{BridgeSource, UpstreamError};
use crate::models::{Category, Event};

/// One parsed page: its lifts and the link to the following page.
#[derive(Debug, Default)]
pub struct Page {
    pub events: Vec<Event>,
    pub next: Option<Url>,
}

pub struct TowerBridgeSource {
    client: Client,
    url: String,
    max_pages: usize,
}

impl TowerBridgeSource {
    pub fn new(client: Client, url: impl Into<String>, max_pages: usize) -> Self {
        Self {
            client,
            url: url.into(),
            max_pages: max_pages.max(1),
        }
    }
}

#[async_trait]
impl BridgeSource for TowerBridgeSource {
    async fn bridge_lifts(&self) -> Result<Vec<Event>, UpstreamError> {
        if self.url.is_empty() {
            return Err(UpstreamError::NotConfigured);
        }
        let mut next = Some(Url::parse(&self.url).map_err(|e| UpstreamError::Decode(e.to_string()))?);
        let mut events = Vec::new();
        let mut pages = 0;

        while let Some(url) = next.take() {
            if pages == self.max_pages {
                tracing::warn!(max_pages = self.max_pages, "Bridge pager limit reached, stopping");
                break;
            }
            pages += 1;
            tracing::debug!(url = %url, page = pages, "Fetching bridge lift page");

            let body = get_body(&self.client, url.as_str()).await?;
            let page = parse_page(&body, &url)?;
            events.extend(page.events);
            next = page.next;
        }

        tracing::info!(count = events.len(), pages, "Retrieved bridge lift events");
        Ok(events)
    }
}

/// Parse lift rows and the next-page link out of one HTML page.
pub fn parse_page(html: &str, page_url: &Url) -> Result<Page, UpstreamError> {
    let document = Html::parse_document(html);
    let rows = selector("tbody tr")?;
    let date = selector("td:nth-child(2) time")?;
    let time = selector("td:nth-child(3) time")?;
    let vessel = selector("td:nth-child(4)")?;
    let direction = selector("td:nth-child(5)")?;

    let mut events = Vec::new();
    for row in document.select(&rows) {
        let name = text(row, &vessel);
        if name.is_empty() {
            continue;
        }
        let Some(timestamp) = row_timestamp(row, &date, &time) else {
            tracing::warn!(vessel = %name, "Bridge lift row without a usable time, skipping");
            continue;
        };

        let mut event = Event::new(name, Category::Bridge, timestamp);
        event.direction = Some(text(row, &direction)).filter(|d| !d.is_empty());
        events.push(event);
    }

    Ok(Page {
        events,
        next: next_page(&document, page_url)?,
    })
}

/// Prefer the full datetime on the time cell; fall back to midnight on the date cell.
fn row_timestamp(row: ElementRef<'_>, date: &Selector, time: &Selector) -> Option<DateTime<Utc>> {
    let attr = |sel: &Selector| {
        row.select(sel)
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .map(str::trim)
    };

    if let Some(parsed) = attr(time).and_then(|raw| DateTime::parse_from_rfc3339(raw).ok()) {
        return Some(parsed.with_timezone(&Utc));
    }
    let raw = attr(date)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
}

/// The link in the pager item after the one marked as the current page.
fn next_page(document: &Html, page_url: &Url) -> Result<Option<Url>, UpstreamError> {
    let current = selector("nav.pager a[title='Current page']")?;
    let anchor = selector("a")?;

    let Some(current) = document.select(&current).next() else {
        return Ok(None);
    };
    let href = current
        .parent()
        .into_iter()
        .flat_map(|item| item.next_siblings())
        .filter_map(ElementRef::wrap)
        .next()
        .and_then(|item| item.select(&anchor).next())
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty());

    match href {
        Some(href) => page_url
            .join(href)
            .map(Some)
            .map_err(|e| UpstreamError::Decode(format!("bad pager link {href}: {e}"))),
        None => Ok(None),
    }
}

fn selector(css: &str) -> Result<Selector, UpstreamError> {
    Selector::parse(css).map_err(|e| UpstreamError::Decode(format!("selector {css}: {e}")))
}

fn text(row: ElementRef<'_>, sel: &Selector) -> String {
    row.select(sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}
