use std::collections::VecDeque;

use crate::error::ConvertError;
use crate::model::{TextRun, WordHit};
use crate::page_text::PageText;

/// Vertical slack when deciding that two runs share a baseline.
const LINE_TOLERANCE: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordQuery {
    Exact(String),
    Substring(String),
}

impl WordQuery {
    #[must_use]
    pub fn matches(&self, word: &str) -> bool {
        match self {
            Self::Exact(text) => word == text,
            Self::Substring(text) => word.contains(text.as_str()),
        }
    }
}

/// Joins adjacent glyph runs on a line into words. Runs whose horizontal gap
/// does not exceed `join_tolerance` become one word.
pub(crate) fn join_runs_into_words(runs: &[TextRun], join_tolerance: f64) -> Vec<TextRun> {
    let mut sorted = runs
        .iter()
        .filter(|run| !run.text.trim().is_empty())
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| {
        a.rect
            .top
            .total_cmp(&b.rect.top)
            .then(a.rect.left.total_cmp(&b.rect.left))
    });

    let mut words: Vec<TextRun> = Vec::new();
    for run in sorted {
        if let Some(word) = words.last_mut()
            && (run.rect.top - word.rect.top).abs() <= LINE_TOLERANCE
            && run.rect.left - word.rect.right <= join_tolerance
        {
            word.text.push_str(&run.text);
            word.rect.top = word.rect.top.min(run.rect.top);
            word.rect.right = word.rect.right.max(run.rect.right);
            word.rect.bottom = word.rect.bottom.max(run.rect.bottom);
            continue;
        }
        words.push(run.clone());
    }

    for word in &mut words {
        let trimmed = word.text.trim();
        if trimmed.len() != word.text.len() {
            word.text = trimmed.to_string();
        }
    }
    words
}

/// Single-pass, forward-only search over all pages. Yields `(query index,
/// hit)` pairs; re-running the search is the only way to restart it.
pub struct WordSearch<'a, S: PageText> {
    source: &'a S,
    queries: &'a [WordQuery],
    join_tolerance: f64,
    next_page: u32,
    page_count: u32,
    pending: VecDeque<(usize, WordHit)>,
}

pub fn search_words<'a, S: PageText>(
    source: &'a S,
    queries: &'a [WordQuery],
    join_tolerance: f64,
) -> WordSearch<'a, S> {
    WordSearch {
        source,
        queries,
        join_tolerance,
        next_page: 1,
        page_count: source.page_count(),
        pending: VecDeque::new(),
    }
}

impl<S: PageText> Iterator for WordSearch<'_, S> {
    type Item = Result<(usize, WordHit), ConvertError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(hit) = self.pending.pop_front() {
                return Some(Ok(hit));
            }
            if self.queries.is_empty() || self.next_page > self.page_count {
                return None;
            }
            let page = self.next_page;
            self.next_page += 1;

            let runs = match self.source.glyph_runs(page) {
                Ok(runs) => runs,
                Err(error) => return Some(Err(error)),
            };
            let words = join_runs_into_words(&runs, self.join_tolerance);
            for (index, query) in self.queries.iter().enumerate() {
                for word in &words {
                    if query.matches(&word.text) {
                        self.pending.push_back((
                            index,
                            WordHit {
                                text: word.text.clone(),
                                page,
                                rect: word.rect,
                            },
                        ));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{WordQuery, join_runs_into_words, search_words};
    use crate::error::ConvertError;
    use crate::model::{Rect, TextRun};
    use crate::page_text::PageText;

    fn run(text: &str, left: f64, top: f64, right: f64) -> TextRun {
        TextRun {
            text: text.to_string(),
            rect: Rect {
                left,
                top,
                right,
                bottom: top + 12.0,
            },
        }
    }

    struct FakePages {
        pages: Vec<Vec<TextRun>>,
    }

    impl PageText for FakePages {
        fn page_count(&self) -> u32 {
            u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
        }

        fn page_bounds(&self, _page: u32) -> Result<Rect, ConvertError> {
            Ok(Rect {
                left: 0.0,
                top: 0.0,
                right: 612.0,
                bottom: 792.0,
            })
        }

        fn glyph_runs(&self, page: u32) -> Result<Vec<TextRun>, ConvertError> {
            Ok(self.pages[page as usize - 1].clone())
        }
    }

    #[test]
    fn joins_adjacent_runs_within_tolerance() {
        let runs = vec![
            run("Gross ", 10.0, 100.0, 45.0),
            run("Amount", 47.0, 100.0, 80.0),
            run("Total", 300.0, 100.0, 330.0),
        ];
        let words = join_runs_into_words(&runs, 3.0);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Gross Amount");
        assert_eq!(words[0].rect.left, 10.0);
        assert_eq!(words[0].rect.right, 80.0);
        assert_eq!(words[1].text, "Total");
    }

    #[test]
    fn keeps_runs_apart_across_lines_and_gaps() {
        let runs = vec![
            run("Alpha", 10.0, 100.0, 40.0),
            run("Beta", 44.5, 130.0, 70.0),
        ];
        let words = join_runs_into_words(&runs, 10.0);
        assert_eq!(words.len(), 2);
    }

    #[test]
    fn exact_and_substring_queries_match_differently() {
        let queries = vec![
            WordQuery::Exact("Amount".to_string()),
            WordQuery::Substring("mou".to_string()),
        ];
        assert!(queries[0].matches("Amount"));
        assert!(!queries[0].matches("Amounts"));
        assert!(queries[1].matches("Amounts"));
    }

    #[test]
    fn searches_pages_in_order_and_reports_pages() {
        let source = FakePages {
            pages: vec![
                vec![run("Amount", 10.0, 50.0, 60.0)],
                vec![run("Amount", 10.0, 70.0, 60.0)],
            ],
        };
        let queries = vec![WordQuery::Exact("Amount".to_string())];

        let hits = search_words(&source, &queries, 3.0)
            .collect::<Result<Vec<_>, _>>()
            .expect("search should succeed");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].1.page, 1);
        assert_eq!(hits[0].1.rect.top, 50.0);
        assert_eq!(hits[1].1.page, 2);
    }

    #[test]
    fn empty_query_list_yields_nothing() {
        let source = FakePages { pages: vec![vec![]] };
        assert_eq!(search_words(&source, &[], 3.0).count(), 0);
    }
}
