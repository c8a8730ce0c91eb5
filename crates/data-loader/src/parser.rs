//! HTML parsers for the origin's film-log and relation-listing pages.
//!
//! Pages are scraped, so there is no schema contract beyond the CSS
//! selectors below. None of these functions fail: a missing optional field
//! degrades to its default, and an element without a detail link is skipped.
//!
//! - film log: `ul.poster-list > li`, each with a `[data-target-link]`
//!   element, a poster `img[alt]`, an optional `p.poster-viewingdata` star
//!   rating and an optional `span.like` marker
//! - pagination: the last `li.paginate-page` holds the total page count
//! - relations: `a.avatar[href]` per user and `a.next[href]` for the next page

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use crate::types::{FilmRecord, Handle, StarRating};

struct Selectors {
    poster: Selector,
    target_link: Selector,
    image: Selector,
    viewing_data: Selector,
    like: Selector,
    paginate_page: Selector,
    avatar: Selector,
    next: Selector,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static CSS selector must parse")
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    poster: selector("ul.poster-list > li"),
    target_link: selector("[data-target-link]"),
    image: selector("img"),
    viewing_data: selector("p.poster-viewingdata"),
    like: selector("span.like"),
    paginate_page: selector("li.paginate-page"),
    avatar: selector("a.avatar"),
    next: selector("a.next"),
});

/// One page of a relation listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationPage {
    /// Handles linked from the page, in document order
    pub handles: Vec<Handle>,
    /// Site-relative href of the next page, if any
    pub next: Option<String>,
}

/// Extract every film record from one page of a user's film log.
///
/// Records come back in document order.
pub fn parse_film_page(html: &str) -> Vec<FilmRecord> {
    film_records(&Html::parse_document(html))
}

fn film_records(document: &Html) -> Vec<FilmRecord> {
    let selectors = &*SELECTORS;

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for poster in document.select(&selectors.poster) {
        match parse_poster(poster, selectors) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} poster(s) without a detail link", skipped);
    }
    records
}

fn parse_poster(poster: ElementRef<'_>, selectors: &Selectors) -> Option<FilmRecord> {
    let link = poster
        .select(&selectors.target_link)
        .find_map(|el| el.value().attr("data-target-link"))?
        .trim();

    let id = film_id_from_link(link)?;

    let title = poster
        .select(&selectors.image)
        .find_map(|img| img.value().attr("alt"))
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());

    let rating = poster
        .select(&selectors.viewing_data)
        .next()
        .and_then(|p| StarRating::from_glyphs(&p.text().collect::<String>()));

    let liked = poster.select(&selectors.like).next().is_some();

    Some(FilmRecord {
        id,
        title,
        rating,
        liked,
        link: link.to_string(),
    })
}

/// Derive a film id from its detail link: the final path segment.
///
/// `/film/the-matrix/` -> `the-matrix`
pub fn film_id_from_link(link: &str) -> Option<String> {
    link.trim()
        .trim_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Read the total page count from a film-log page's pagination control.
///
/// Returns 1 when the control is absent or unreadable.
pub fn parse_page_count(html: &str) -> usize {
    page_count(&Html::parse_document(html))
}

fn page_count(document: &Html) -> usize {
    document
        .select(&SELECTORS.paginate_page)
        .last()
        .and_then(|li| li.text().collect::<String>().trim().parse::<usize>().ok())
        .filter(|&count| count >= 1)
        .unwrap_or(1)
}

/// Parse records and page count from the first page of a film log.
///
/// The page is parsed into a DOM once and both are read from it.
pub fn parse_first_film_page(html: &str) -> (Vec<FilmRecord>, usize) {
    let document = Html::parse_document(html);
    (film_records(&document), page_count(&document))
}

/// Extract the handles and the next-page link from a relation listing.
pub fn parse_relation_page(html: &str) -> RelationPage {
    let document = Html::parse_document(html);
    let selectors = &*SELECTORS;

    let handles = document
        .select(&selectors.avatar)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| Handle::new(href).ok())
        .collect();

    let next = document
        .select(&selectors.next)
        .find_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string);

    RelationPage { handles, next }
}
