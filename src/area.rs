use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::error::ConvertError;
use crate::model::Rect;
use crate::options::TableOptions;
use crate::page_text::PageText;
use crate::word_search::{WordQuery, search_words};

/// Resolves the table body rectangle for every page that carries one.
///
/// A page enters the map when a required column header is found on it; its
/// top edge is pinned below the lowest required header seen there. Footer
/// matches then pull the bottom edge up. Pages without any required header
/// are left out entirely.
pub fn resolve_table_areas<S: PageText>(
    source: &S,
    options: &TableOptions,
) -> Result<BTreeMap<u32, Rect>, ConvertError> {
    let mut areas = BTreeMap::new();

    let header_queries = options
        .columns
        .iter()
        .filter(|column| column.required)
        .map(|column| WordQuery::Exact(column.name.clone()))
        .collect::<Vec<_>>();
    for hit in search_words(source, &header_queries, options.word_join_tolerance) {
        let (_, hit) = hit?;
        let area = match areas.entry(hit.page) {
            Entry::Vacant(entry) => entry.insert(source.page_bounds(hit.page)?),
            Entry::Occupied(entry) => entry.into_mut(),
        };
        area.top = area.top.max(hit.rect.top);
    }

    let footer_queries = options
        .footers
        .iter()
        .map(|footer| WordQuery::Substring(footer.clone()))
        .collect::<Vec<_>>();
    for hit in search_words(source, &footer_queries, options.word_join_tolerance) {
        let (_, hit) = hit?;
        if let Some(area) = areas.get_mut(&hit.page) {
            let edge = if options.include_footer {
                hit.rect.bottom
            } else {
                hit.rect.top
            };
            area.bottom = area.bottom.min(edge);
        }
    }

    Ok(areas)
}

pub(crate) fn offset_area(area: Rect, offset: Rect) -> Rect {
    Rect {
        left: area.left + offset.left,
        top: area.top + offset.top,
        right: area.right + offset.right,
        bottom: area.bottom + offset.bottom,
    }
}
