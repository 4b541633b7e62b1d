//! Cursor-following page aggregation for the `list_all_*` operations.
//!
//! The loop starts with no cursor, feeds each page's `next_cursor` into
//! the next fetch, and stops when the server omits it (or sends an empty
//! string). Null page entries are skipped. Any page failure discards
//! everything collected so far.

use std::{future::Future, num::NonZeroUsize};

use tracing::debug;

use crate::error::{McpError, McpResult};

/// One page of a paginated listing. `items` may contain holes; the
/// aggregator drops them rather than failing the whole listing.
pub(crate) struct Page<T> {
    pub items: Vec<Option<T>>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A page with no holes, as rmcp's typed results produce.
    pub(crate) fn full(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self {
            items: items.into_iter().map(Some).collect(),
            next_cursor,
        }
    }
}

/// Fetch pages through `fetch` until the cursor chain ends, returning the
/// concatenated items in server order.
pub(crate) async fn collect_pages<T, F, Fut>(
    op: &'static str,
    page_limit: Option<NonZeroUsize>,
    mut fetch: F,
) -> McpResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = McpResult<Page<T>>>,
{
    let mut all = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        if let Some(limit) = page_limit {
            if pages >= limit.get() {
                // Surfaced like any other page failure, with the cap as
                // the underlying cause.
                return Err(McpError::Aggregation {
                    op,
                    page: pages + 1,
                    source: Box::new(McpError::PageLimitExceeded {
                        op,
                        limit: limit.get(),
                    }),
                });
            }
        }

        let page = fetch(cursor.take()).await.map_err(|e| McpError::Aggregation {
            op,
            page: pages + 1,
            source: Box::new(e),
        })?;
        pages += 1;

        let before = all.len();
        all.extend(page.items.into_iter().flatten());
        debug!(op, page = pages, items = all.len() - before, "collected page");

        cursor = page.next_cursor.filter(|c| !c.is_empty());
        if cursor.is_none() {
            return Ok(all);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[tokio::test]
    async fn follows_cursors_in_order() {
        let seen = Mutex::new(Vec::new());
        let items = collect_pages("list_all_tools", None, |cursor| {
            seen.lock().unwrap().push(cursor.clone());
            async move {
                Ok(match cursor.as_deref() {
                    None => Page::full(vec![1, 2], Some("c1".to_string())),
                    Some("c1") => Page::full(vec![3], Some("c2".to_string())),
                    Some("c2") => Page::full(vec![4, 5], None),
                    other => panic!("unexpected cursor {:?}", other),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn skips_null_items() {
        let items = collect_pages("list_all_prompts", None, |_| async {
            Ok(Page {
                items: vec![Some("a"), None, Some("b")],
                next_cursor: None,
            })
        })
        .await
        .unwrap();

        assert_eq!(items, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn empty_string_cursor_ends_the_chain() {
        let calls = Mutex::new(0);
        let items = collect_pages("list_all_resources", None, |_| {
            *calls.lock().unwrap() += 1;
            async { Ok(Page::full(vec![7], Some(String::new()))) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![7]);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn mid_chain_failure_discards_earlier_pages() {
        let result: McpResult<Vec<i32>> = collect_pages("list_all_tools", None, |cursor| async move {
            match cursor {
                None => Ok(Page::full(vec![1], Some("c1".to_string()))),
                Some(_) => Err(McpError::Transport("stream reset".to_string())),
            }
        })
        .await;

        match result {
            Err(McpError::Aggregation { op, page, .. }) => {
                assert_eq!(op, "list_all_tools");
                assert_eq!(page, 2);
            }
            other => panic!("expected aggregation error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn page_limit_halts_a_cursor_loop() {
        let limit = NonZeroUsize::new(3);
        let result: McpResult<Vec<i32>> = collect_pages("list_all_tools", limit, |_| async {
            Ok(Page::full(vec![1], Some("again".to_string())))
        })
        .await;

        match result {
            Err(McpError::Aggregation { op, page, source }) => {
                assert_eq!(op, "list_all_tools");
                assert_eq!(page, 4);
                assert!(matches!(
                    *source,
                    McpError::PageLimitExceeded { limit: 3, .. }
                ));
            }
            other => panic!("expected aggregation error, got {:?}", other.map(|_| ())),
        }
    }
}
