//! services/console/src/shell/render.rs
//!
//! Turns catalog views into terminal text.

use bookstore_core::{BookRecord, CatalogView, QueryMode};
use std::fmt::Write as _;

/// The listing, its pagination footer, and any error from the last fetch.
pub fn render_view(view: &CatalogView) -> String {
    let mut out = String::new();
    let result = &view.result;
    let query = &view.query;

    let heading = match query.mode {
        QueryMode::Browse => format!("Books sorted by {}", query.sort_key),
        QueryMode::Search => format!("Search results for '{}'", query.search_term),
        QueryMode::Filter => "Filtered books".to_string(),
    };
    let _ = writeln!(out, "{heading}");

    if let Some(error) = &result.error {
        let _ = writeln!(out, "! {}", error.message);
    }

    if result.is_loading {
        let _ = writeln!(out, "Loading books...");
    } else if result.items.is_empty() {
        let _ = writeln!(out, "No books found.");
    } else {
        for book in &result.items {
            let _ = writeln!(out, "{}", render_row(book));
        }
    }

    if query.mode == QueryMode::Browse && result.total_pages > 0 {
        let prev = if result.can_go_previous(query.page) { "< prev" } else { "      " };
        let next = if result.can_go_next(query.page) { "next >" } else { "" };
        let _ = writeln!(
            out,
            "{prev}  Page {} of {}  {next}",
            query.page + 1,
            result.total_pages
        );
    }
    out.trim_end().to_string()
}

pub fn render_row(book: &BookRecord) -> String {
    format!(
        "  #{:<6} {} by {}  ${:.2}  {:.1}/5",
        book.id.to_string(),
        or_placeholder(&book.title, "Untitled Book"),
        or_placeholder(&book.author, "Unknown Author"),
        book.price,
        book.rating
    )
}

/// The single-book details page.
pub fn render_book(book: &BookRecord) -> String {
    let price = if book.price > 0.0 {
        format!("${:.2}", book.price)
    } else {
        "N/A".to_string()
    };
    let rating = if book.rating > 0.0 {
        format!("{} / 5.0", book.rating)
    } else {
        "No rating".to_string()
    };
    let published = book
        .published_date
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    format!(
        "{}\nby {}\n  Category:  {}\n  Price:     {}\n  Rating:    {}\n  Published: {}",
        or_placeholder(&book.title, "Untitled Book"),
        or_placeholder(&book.author, "Unknown Author"),
        or_placeholder(&book.category, "N/A"),
        price,
        rating,
        published
    )
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}
