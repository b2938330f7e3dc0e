//! Results-page scraping.
//!
//! The appointment description lives in a table that wraps the `#ApptForm`
//! element: third row, `.alert` cell, text shaped like
//! `"Saturday, March 14, 2026 at 9:30 AM"`. A page without that text is the
//! site's normal "no open slot" response, not an error.

use scraper::{ElementRef, Html, Selector};

/// Everything worth reading off one results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScrape {
    /// The raw appointment description with `" at "` normalized to a single
    /// space, ready for date parsing. `None` when the page shows no slot.
    pub appointment_text: Option<String>,
    /// Text of any `.validation_error` nodes, for diagnostic logging.
    pub validation_errors: Vec<String>,
}

#[must_use]
pub fn scrape_results_page(html: &str) -> PageScrape {
    let document = Html::parse_document(html);
    PageScrape {
        appointment_text: extract_appointment_text(&document),
        validation_errors: extract_validation_errors(&document),
    }
}

fn extract_appointment_text(document: &Html) -> Option<String> {
    let appt_selector = Selector::parse("#ApptForm").expect("valid ApptForm selector");
    let row_selector = Selector::parse("tr").expect("valid tr selector");
    let alert_selector = Selector::parse(".alert").expect("valid alert selector");

    let appt = document.select(&appt_selector).next()?;
    let table = appt
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")?;

    let third_row = table.select(&row_selector).nth(2)?;
    let alert = third_row.select(&alert_selector).next()?;

    let text = alert.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // The site writes "<date> at <time>"; collapse for date parsing.
    Some(text.replacen(" at ", " ", 1))
}

fn extract_validation_errors(document: &Html) -> Vec<String> {
    let selector = Selector::parse(".validation_error").expect("valid validation_error selector");
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
