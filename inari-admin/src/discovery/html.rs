//! Scans of a parsed profile page: `<link rel>` lookup and the
//! representative h-card.
//!
//! Both are explicit depth-first walks over the element tree.

use inari_common::HCard;
use scraper::{ElementRef, Html};
use url::Url;

/// First `<link rel="{rel}" href>` in document order.
pub fn find_link_rel(element: ElementRef<'_>, rel: &str) -> Option<String> {
    let value = element.value();
    if value.name() == "link" && rel_matches(value.attr("rel"), rel) {
        if let Some(href) = value.attr("href") {
            return Some(href.to_string());
        }
    }

    element
        .children()
        .filter_map(ElementRef::wrap)
        .find_map(|child| find_link_rel(child, rel))
}

fn rel_matches(attr: Option<&str>, rel: &str) -> bool {
    attr.is_some_and(|attr| {
        attr.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case(rel))
    })
}

/// The h-card describing the page's owner: a top level h-card whose `u-url`
/// and `u-uid` both equal the page URL. Empty when there is none.
pub fn representative_hcard(document: &Html, page_url: &Url) -> HCard {
    let mut roots = Vec::new();
    collect_roots(document.root_element(), &mut roots);

    roots
        .into_iter()
        .filter(|root| root.value().classes().any(|class| class == "h-card"))
        .map(|root| {
            let mut properties = CardProperties::default();
            collect_properties(root, page_url, &mut properties);
            properties
        })
        .find(|properties| {
            properties.url.iter().any(|url| same_url(url, page_url))
                && properties.uid.iter().any(|uid| same_url(uid, page_url))
        })
        .map(|properties| HCard {
            name: properties.name.into_iter().next().unwrap_or_default(),
            url: properties.url.into_iter().next().unwrap_or_default(),
            photo: properties.photo.into_iter().next().unwrap_or_default(),
        })
        .unwrap_or_default()
}

#[derive(Debug, Default)]
struct CardProperties {
    name: Vec<String>,
    url: Vec<String>,
    uid: Vec<String>,
    photo: Vec<String>,
}

fn is_root(element: ElementRef<'_>) -> bool {
    element
        .value()
        .classes()
        .any(|class| class.starts_with("h-"))
}

/// Top level microformat roots. Roots nested in other roots belong to their parent.
fn collect_roots<'a>(element: ElementRef<'a>, roots: &mut Vec<ElementRef<'a>>) {
    if is_root(element) {
        roots.push(element);
        return;
    }
    for child in element.children().filter_map(ElementRef::wrap) {
        collect_roots(child, roots);
    }
}

fn collect_properties(element: ElementRef<'_>, base: &Url, properties: &mut CardProperties) {
    for child in element.children().filter_map(ElementRef::wrap) {
        for class in child.value().classes() {
            match class {
                "p-name" => properties.name.push(text_value(child)),
                "u-url" => properties.url.push(url_value(child, base)),
                "u-uid" => properties.uid.push(url_value(child, base)),
                "u-photo" => properties.photo.push(url_value(child, base)),
                _ => {}
            }
        }

        if !is_root(child) {
            collect_properties(child, base, properties);
        }
    }
}

fn text_value(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn url_value(element: ElementRef<'_>, base: &Url) -> String {
    let value = element.value();
    let raw = value
        .attr("href")
        .or_else(|| value.attr("src"))
        .or_else(|| value.attr("value"))
        .map(str::to_string)
        .unwrap_or_else(|| text_value(element));

    match base.join(raw.trim()) {
        Ok(url) => url.to_string(),
        Err(_) => raw,
    }
}

fn same_url(value: &str, page_url: &Url) -> bool {
    Url::parse(value).is_ok_and(|url| &url == page_url)
}
