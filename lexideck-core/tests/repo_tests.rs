use chrono::{Duration, Utc};
use lexideck_core::memory::MemoryRepo;
use lexideck_core::{
    filter_by_text, Card, ContentSource, CoreError, Grade, NewCard, PageQuery, ProgressSink,
    RepoProgress, RepoSource, Repository, ReviewRecord,
};
use std::sync::Arc;

fn dated(phrase: &str, minutes_ago: i64, categories: &[&str]) -> Card {
    let mut c = Card::new(phrase, format!("{phrase}!"));
    c.created_at = Utc::now() - Duration::minutes(minutes_ago);
    c.categories = categories.iter().map(|s| s.to_string()).collect();
    c
}

fn seeded() -> MemoryRepo {
    MemoryRepo::with_cards([
        dated("c", 1, &["verbs"]),
        dated("a", 3, &["nouns"]),
        dated("b", 2, &["Verbs"]),
    ])
}

#[tokio::test]
async fn pages_follow_creation_order() {
    let repo = seeded();
    let first = repo.page_cards(&PageQuery::first(2)).await.unwrap();
    let phrases: Vec<_> = first.cards.iter().map(|c| c.phrase.as_str()).collect();
    assert_eq!(phrases, ["a", "b"]);
    assert_eq!(first.next_cursor.as_deref(), Some("2"));

    let second = repo
        .page_cards(&PageQuery {
            cursor: first.next_cursor,
            limit: 2,
            category: None,
        })
        .await
        .unwrap();
    assert_eq!(second.cards.len(), 1);
    assert_eq!(second.cards[0].phrase, "c");
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn category_filter_is_case_insensitive() {
    let repo = seeded();
    let page = repo
        .page_cards(&PageQuery {
            cursor: None,
            limit: 10,
            category: Some("verbs".into()),
        })
        .await
        .unwrap();
    let phrases: Vec<_> = page.cards.iter().map(|c| c.phrase.as_str()).collect();
    assert_eq!(phrases, ["b", "c"]);
}

#[tokio::test]
async fn bad_cursor_is_rejected() {
    let repo = seeded();
    let err = repo
        .page_cards(&PageQuery {
            cursor: Some("not-a-cursor".into()),
            limit: 1,
            category: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Invalid("cursor")));
}

#[tokio::test]
async fn zero_page_size_still_progresses() {
    let repo = seeded();
    let page = repo.page_cards(&PageQuery::first(0)).await.unwrap();
    assert_eq!(page.cards.len(), 1);
    assert!(page.next_cursor.is_some());
}

#[tokio::test]
async fn review_updates_card_history() {
    let repo = MemoryRepo::new();
    let card = repo
        .add_card(NewCard {
            phrase: "hola".into(),
            meaning: "hello".into(),
            example: Some("¡Hola, amigo!".into()),
            categories: vec!["greeting".into()],
        })
        .await
        .unwrap();

    let review = ReviewRecord::new(card.id.clone(), Grade::Good);
    repo.record_review(&review).await.unwrap();

    let stored = repo.get_card(&card.id).await.unwrap();
    assert_eq!(stored.grades, [Grade::Good]);
    assert_eq!(stored.last_reviewed_at, Some(review.reviewed_at));
    assert_eq!(repo.list_reviews_for_card(&card.id).await.unwrap(), [review]);

    let missing = ReviewRecord::new("nope", Grade::Poor);
    assert!(matches!(
        repo.record_review(&missing).await,
        Err(CoreError::NotFound("card"))
    ));
}

#[tokio::test]
async fn empty_phrase_rejected() {
    let repo = MemoryRepo::new();
    let err = repo.add_card(NewCard::default()).await.unwrap_err();
    assert!(matches!(err, CoreError::Invalid(_)));
}

#[tokio::test]
async fn repo_adapters_bridge_source_and_sink() {
    let repo: Arc<dyn Repository> = Arc::new(seeded());
    let source = RepoSource::new(repo.clone(), 2).with_category(Some("nouns".into()));
    let page = source.fetch_page(None).await.unwrap();
    assert_eq!(page.cards.len(), 1);
    assert_eq!(page.cards[0].phrase, "a");

    let progress = RepoProgress::new(repo.clone());
    progress
        .record(&ReviewRecord::new(page.cards[0].id.clone(), Grade::Best))
        .await
        .unwrap();
    assert_eq!(repo.get_card(&page.cards[0].id).await.unwrap().last_grade(), Some(Grade::Best));

    let err = RepoSource::new(repo, 2).fetch_page(Some("x")).await.unwrap_err();
    assert!(err.to_string().contains("cursor"));
}

#[test]
fn text_filter_searches_all_fields() {
    let mut c1 = Card::new("hola", "hello");
    c1.categories = vec!["greeting".into()];
    let c2 = Card::new("adios", "goodbye");
    let v = vec![c1, c2];

    assert_eq!(filter_by_text(&v, "HOL").len(), 1);
    assert_eq!(filter_by_text(&v, "greet")[0].phrase, "hola");
    assert_eq!(filter_by_text(&v, "bye")[0].phrase, "adios");
    assert_eq!(filter_by_text(&v, "  ").len(), 2);
}
