mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{rankings, SpyStore};
use keyset_db::Store;
use listings::contract::error::{ErrorClass, ListingError};
use listings::contract::model::{AnimalRanking, AnimalRankingSortKey, ListRequest};
use listings::{ListingsConfig, RankingsRequest, RankingsService};
use serde_json::json;
use tokio_util::sync::CancellationToken;

fn names(items: &[AnimalRanking]) -> Vec<&str> {
    items.iter().map(|r| r.name.as_str()).collect()
}

fn by_rank(cursor: &str) -> RankingsRequest {
    ListRequest::new(AnimalRankingSortKey::Rank, cursor)
}

#[tokio::test]
async fn walks_rankings_two_at_a_time() -> Result<()> {
    let svc = rankings().await?;
    let token = CancellationToken::new;

    let p1 = svc.list(&by_rank("0").with_limit(2), token()).await?;
    assert_eq!(names(&p1.items), vec!["Lion", "Tiger"]);
    assert_eq!(p1.page_info.next_cursor.as_deref(), Some("2"));
    assert_eq!(p1.page_info.limit, 2);

    let p2 = svc.list(&by_rank("2").with_limit(2), token()).await?;
    assert_eq!(names(&p2.items), vec!["Elephant", "Leopard"]);
    assert_eq!(p2.page_info.next_cursor.as_deref(), Some("4"));

    let p3 = svc.list(&by_rank("4").with_limit(2), token()).await?;
    assert_eq!(names(&p3.items), vec!["Wolf"]);
    assert_eq!(p3.page_info.next_cursor, None);

    let p4 = svc.list(&by_rank("5").with_limit(2), token()).await?;
    assert!(p4.items.is_empty());
    assert_eq!(p4.page_info.next_cursor, None);
    Ok(())
}

#[tokio::test]
async fn name_set_filter() -> Result<()> {
    let svc = rankings().await?;
    let req = by_rank("0")
        .with_limit(10)
        .with_filter("name", json!(["Elephant", "Leopard"]));

    let page = svc.list(&req, CancellationToken::new()).await?;
    assert_eq!(names(&page.items), vec!["Elephant", "Leopard"]);
    assert_eq!(page.page_info.next_cursor, None);
    Ok(())
}

#[tokio::test]
async fn empty_set_filter_is_ignored() -> Result<()> {
    let svc = rankings().await?;
    let page = svc
        .list(
            &by_rank("0").with_limit(10).with_filter("name", json!([])),
            CancellationToken::new(),
        )
        .await?;
    assert_eq!(page.items.len(), 5);
    Ok(())
}

#[tokio::test]
async fn next_key_follows_requested_sort_key() -> Result<()> {
    let svc = rankings().await?;
    let req = ListRequest::new(AnimalRankingSortKey::Name, "")
        .with_limit(2)
        .with_order("ASC");

    let p1 = svc.list(&req, CancellationToken::new()).await?;
    assert_eq!(names(&p1.items), vec!["Elephant", "Leopard"]);
    assert_eq!(p1.page_info.next_cursor.as_deref(), Some("Leopard"));

    let req2 = ListRequest {
        cursor: p1.page_info.next_cursor.clone().unwrap(),
        ..req
    };
    let p2 = svc.list(&req2, CancellationToken::new()).await?;
    assert_eq!(names(&p2.items), vec!["Lion", "Tiger"]);
    Ok(())
}

#[tokio::test]
async fn descending_walk_covers_every_row_once() -> Result<()> {
    let svc = rankings().await?;
    let mut cursor = i64::MAX.to_string();
    let mut seen = Vec::new();

    loop {
        let page = svc
            .list(
                &by_rank(&cursor).with_limit(2).with_order("DESC"),
                CancellationToken::new(),
            )
            .await?;
        seen.extend(page.items.iter().map(|r| r.rank));
        match page.page_info.next_cursor {
            Some(next) => cursor = next,
            None => break,
        }
    }

    assert_eq!(seen, vec![5, 4, 3, 2, 1]);
    Ok(())
}

#[tokio::test]
async fn limit_is_clamped() -> Result<()> {
    let store: Arc<dyn Store> = Arc::new(common::seeded_db().await?);
    let svc = RankingsService::new(
        store,
        ListingsConfig {
            default_page_size: 3,
            max_page_size: 4,
            query_timeout: None,
        },
    );

    let defaulted = svc.list(&by_rank("0"), CancellationToken::new()).await?;
    assert_eq!(defaulted.items.len(), 3);
    assert_eq!(defaulted.page_info.limit, 3);

    let zero = svc.list(&by_rank("0").with_limit(0), CancellationToken::new()).await?;
    assert_eq!(zero.page_info.limit, 3);

    let capped = svc.list(&by_rank("0").with_limit(500), CancellationToken::new()).await?;
    assert_eq!(capped.items.len(), 4);
    assert_eq!(capped.page_info.next_cursor.as_deref(), Some("4"));
    Ok(())
}

async fn rejected(req: RankingsRequest) -> (ListingError, usize) {
    let spy = Arc::new(SpyStore::default());
    let svc = RankingsService::new(spy.clone(), ListingsConfig::default());
    let err = svc
        .list(&req, CancellationToken::new())
        .await
        .expect_err("request should be rejected");
    (err, spy.call_count())
}

#[tokio::test]
async fn invalid_requests_never_reach_the_store() {
    let (err, calls) = rejected(by_rank("0").with_order("INVALID")).await;
    assert_eq!(
        err,
        ListingError::InvalidDirection {
            direction: "INVALID".into()
        }
    );
    assert_eq!(err.status(), ErrorClass::Client);
    assert_eq!(calls, 0);

    let (err, calls) = rejected(by_rank("first")).await;
    assert!(matches!(err, ListingError::InvalidCursor { .. }));
    assert_eq!(calls, 0);

    let (err, calls) = rejected(by_rank("0").with_filter("colour", "red")).await;
    assert!(matches!(err, ListingError::InvalidFilter { ref field, .. } if field == "colour"));
    assert_eq!(calls, 0);
}

#[tokio::test]
async fn direction_must_match_exactly() {
    for order in ["asc", "Desc", " ASC", "ASC "] {
        let (err, calls) = rejected(by_rank("0").with_order(order)).await;
        assert_eq!(
            err,
            ListingError::InvalidDirection {
                direction: order.into()
            }
        );
        assert_eq!(calls, 0);
    }
}

#[test]
fn unknown_sort_names_are_invalid_columns() {
    for name in ["", "animal_rank", "RESOURCE_NAME"] {
        let err = name.parse::<AnimalRankingSortKey>().unwrap_err();
        assert!(matches!(err, ListingError::InvalidColumn { ref column } if column == name));
        assert_eq!(err.status(), ErrorClass::Client);
    }
}

#[tokio::test]
async fn spy_sees_assembled_statement() -> Result<()> {
    let spy = Arc::new(SpyStore::default());
    let svc = RankingsService::new(spy.clone(), ListingsConfig::default());

    let page = svc
        .list(
            &by_rank("0").with_limit(2).with_filter("name", json!(["Lion"])),
            CancellationToken::new(),
        )
        .await?;

    assert!(page.items.is_empty());
    assert_eq!(spy.call_count(), 1);
    assert_eq!(
        spy.last_sql.lock().unwrap().as_deref(),
        Some("SELECT * FROM animal_rankings WHERE rank > ? AND name IN (?) ORDER BY rank ASC LIMIT ?")
    );
    Ok(())
}

#[tokio::test]
async fn cancelled_token_yields_cancelled() -> Result<()> {
    let svc = rankings().await?;
    let token = CancellationToken::new();
    token.cancel();

    let err = svc.list(&by_rank("0"), token).await.unwrap_err();
    assert_eq!(err, ListingError::Cancelled);
    Ok(())
}

#[tokio::test]
async fn parallel_calls_are_independent() -> Result<()> {
    let svc = rankings().await?;

    let handles: Vec<_> = ["0", "1", "2", "3"]
        .into_iter()
        .map(|cursor| {
            let svc = svc.clone();
            let req = by_rank(cursor).with_limit(2);
            tokio::spawn(async move { svc.list(&req, CancellationToken::new()).await })
        })
        .collect();

    let mut firsts = Vec::new();
    for h in handles {
        let page = h.await??;
        firsts.push(page.items[0].rank);
    }
    assert_eq!(firsts, vec![1, 2, 3, 4]);
    Ok(())
}
