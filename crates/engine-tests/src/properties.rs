//! Property-based tests for keyset traversal using proptest.

#[cfg(test)]
mod tests {
    use crate::utils::{collect_pages, memory_source, page_ids, sorted_ids};
    use engine_core::reader::KeysetReader;
    use model::{
        core::value::Value,
        pagination::{
            cursor::Cursor,
            order::{ColumnOrder, OrderSpec, SortDirection},
            page::{MAXIMUM_PAGE_SIZE, Page, PageSizePolicy},
            token::CursorToken,
        },
        records::row::RowData,
    };
    use proptest::prelude::*;
    use std::sync::Arc;

    fn direction(asc: bool) -> SortDirection {
        if asc {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    // Two ordering columns with few distinct values so ties are common; the
    // first one nullable.
    fn rows_strategy() -> impl Strategy<Value = Vec<RowData>> {
        prop::collection::vec((prop::option::of(0i64..4), 0i64..3), 0..40).prop_map(|cells| {
            cells
                .into_iter()
                .enumerate()
                .map(|(i, (a, b))| {
                    RowData::from_pairs(
                        "t",
                        [
                            ("id", Value::Int(i as i64)),
                            ("a", a.map_or(Value::Null, Value::Int)),
                            ("b", Value::Int(b)),
                        ],
                    )
                })
                .collect()
        })
    }

    fn order_strategy() -> impl Strategy<Value = OrderSpec> {
        (any::<bool>(), 0u8..3, any::<bool>(), any::<bool>()).prop_map(
            |(a_asc, a_nulls, b_asc, id_asc)| {
                let a = ColumnOrder::new("a", direction(a_asc)).nullable();
                let a = match a_nulls {
                    1 => a.nulls_first(),
                    2 => a.nulls_last(),
                    _ => a,
                };
                OrderSpec::new(vec![
                    a,
                    ColumnOrder::new("b", direction(b_asc)),
                    ColumnOrder::new("id", direction(id_asc)).distinct(),
                ])
                .expect("valid order")
            },
        )
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("tokio runtime")
    }

    proptest! {
        /// Paging until the end returns every row exactly once, in order.
        #[test]
        fn traversal_returns_every_row_once_in_order(
            rows in rows_strategy(),
            order in order_strategy(),
            per_page in 1i64..8,
        ) {
            let order = Arc::new(order);
            let expected = sorted_ids(&rows, &order);

            let returned = runtime().block_on(async {
                let page = Page::new(Arc::clone(&order)).with_per_page(per_page);
                let mut reader = KeysetReader::new(memory_source(rows.clone()), page)
                    .expect("first page has no cursor");
                collect_pages(&mut reader).await.map(|pages| page_ids(&pages))
            });

            prop_assert_eq!(returned.expect("memory source never fails"), expected);
        }

        /// Every requested size maps into `[1, maximum]`.
        #[test]
        fn effective_per_page_is_bounded(requested in any::<i64>()) {
            let page = Page::new(Arc::new("id:asc:distinct".parse::<OrderSpec>().expect("valid order")))
                .with_per_page(requested);
            let size = page.effective_per_page();
            prop_assert!((1..=MAXIMUM_PAGE_SIZE).contains(&size));
        }

        /// Custom policies are normalized before clamping.
        #[test]
        fn custom_policy_is_bounded(default in 0usize..300, maximum in 0usize..300, requested in any::<i64>()) {
            let policy = PageSizePolicy::new(default, maximum);
            let size = policy.clamp(requested);
            prop_assert!(size >= 1);
            prop_assert!(size <= policy.maximum_size());
        }

        /// A token decodes to exactly the cursor it was built from.
        #[test]
        fn token_round_trip_is_exact(
            created in any::<i64>(),
            score in prop::option::of(any::<f64>().prop_filter("finite", |f| f.is_finite())),
            name in "\\PC{0,24}",
            id in any::<u64>(),
        ) {
            let order: OrderSpec = "created:desc,score:asc:nullable,name:asc,id:asc:distinct"
                .parse()
                .expect("valid order");
            let cursor = Cursor::from_pairs([
                ("created", Value::Int(created)),
                ("score", score.map_or(Value::Null, Value::Float)),
                ("name", Value::String(name)),
                ("id", Value::Uint(id)),
            ]);

            let token = CursorToken::encode(&cursor, &order).expect("encodes");
            prop_assert_eq!(CursorToken::decode(&token, &order), Ok(cursor));
        }
    }
}
