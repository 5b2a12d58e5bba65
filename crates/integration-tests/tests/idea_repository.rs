//! Idea CRUD, listing, triage, and the deletion cascade.

use std::sync::Arc;

use ib_core::document::{collections, Patch};
use ib_core::error::AppError;
use ib_core::models::{Category, IdeaFilter, IdeaSort, NewIdea, Role, Status};
use ib_services::{CommentRepository, IdeaRepository, VoteCoordinator};
use integration_tests::{memory_store, reload_idea, reload_user, seed_user, submission};
use uuid::Uuid;

#[tokio::test]
async fn thresholds_are_exact() {
    let store = memory_store();
    let author = seed_user(&store, "Anya", Role::Student).await;
    let ideas = IdeaRepository::new(Arc::clone(&store));

    // One short of each threshold fails.
    let err = ideas
        .create(submission("ab", "1234567890"), &author)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = ideas
        .create(submission("abc", "123456789"), &author)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Exactly at both thresholds succeeds.
    let idea = ideas
        .create(submission("abc", "1234567890"), &author)
        .await
        .unwrap();
    assert_eq!(idea.status, Status::Pending);
    assert_eq!(idea.votes_count, 0);
    assert_eq!(idea.comments_count, 0);
    assert_eq!(idea.views, 0);
    assert!(idea.votes.is_empty());
}

#[tokio::test]
async fn creation_adjusts_the_author_profile() {
    let store = memory_store();
    let author = seed_user(&store, "Anya", Role::Student).await;
    let ideas = IdeaRepository::new(Arc::clone(&store));

    ideas
        .create(
            submission("Water fountains", "One per floor would be enough."),
            &author,
        )
        .await
        .unwrap();

    let after = reload_user(&store, author.id).await;
    assert_eq!(after.ideas_count, 1);
    assert!(after.last_activity > author.last_activity);
}

#[tokio::test]
async fn listing_filters_sorts_and_caps() {
    let store = memory_store();
    let author = seed_user(&store, "Anya", Role::Student).await;
    let ideas = IdeaRepository::new(Arc::clone(&store));
    let votes = VoteCoordinator::new(Arc::clone(&store));

    let mut by_title = std::collections::HashMap::new();
    for (title, category) in [
        ("Meat-free Mondays", Category::Food),
        ("Bigger salad bar", Category::Food),
        ("Evening gym hours", Category::Sports),
    ] {
        let idea = ideas
            .create(
                NewIdea {
                    title: title.into(),
                    description: "A description long enough to pass.".into(),
                    category,
                },
                &author,
            )
            .await
            .unwrap();
        by_title.insert(title, idea.id);
    }

    // Two votes for the salad bar, one for Mondays.
    for name in ["V1", "V2"] {
        let voter = seed_user(&store, name, Role::Student).await;
        votes
            .toggle_vote(by_title["Bigger salad bar"], &voter)
            .await
            .unwrap();
    }
    let voter = seed_user(&store, "V3", Role::Student).await;
    votes
        .toggle_vote(by_title["Meat-free Mondays"], &voter)
        .await
        .unwrap();

    let food_by_votes = ideas
        .list(&IdeaFilter {
            category: Some(Category::Food),
            sort_by: IdeaSort::MostVoted,
            ..IdeaFilter::default()
        })
        .await
        .unwrap();
    let titles: Vec<&str> = food_by_votes.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, ["Bigger salad bar", "Meat-free Mondays"]);

    let newest = ideas.list(&IdeaFilter::default()).await.unwrap();
    assert_eq!(newest.len(), 3);
    assert_eq!(newest[0].title, "Evening gym hours");

    let capped = ideas
        .list(&IdeaFilter {
            limit: 2,
            ..IdeaFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(capped.len(), 2);
}

#[tokio::test]
async fn strangers_cannot_delete_ideas() {
    let store = memory_store();
    let author = seed_user(&store, "Anya", Role::Student).await;
    let stranger = seed_user(&store, "Boris", Role::Teacher).await;
    let ideas = IdeaRepository::new(Arc::clone(&store));

    let idea = ideas
        .create(
            submission("Chess club", "Weekly matches in the library."),
            &author,
        )
        .await
        .unwrap();

    let err = ideas.delete(idea.id, &stranger).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    // Still on the board.
    ideas.get(idea.id).await.unwrap();
}

#[tokio::test]
async fn admins_may_delete_other_peoples_ideas() {
    let store = memory_store();
    let author = seed_user(&store, "Anya", Role::Student).await;
    let admin = seed_user(&store, "Office", Role::Admin).await;
    let ideas = IdeaRepository::new(Arc::clone(&store));

    let idea = ideas
        .create(
            submission("Chess club", "Weekly matches in the library."),
            &author,
        )
        .await
        .unwrap();
    ideas.delete(idea.id, &admin).await.unwrap();

    let err = ideas.get(idea.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("idea", _)));
    // The author's counter follows the idea, not the requester's.
    assert_eq!(reload_user(&store, author.id).await.ideas_count, 0);
}

#[tokio::test]
async fn deletion_cascades_to_comments_and_their_counters() {
    let store = memory_store();
    let author = seed_user(&store, "Anya", Role::Student).await;
    let lena = seed_user(&store, "Lena", Role::Student).await;
    let marat = seed_user(&store, "Marat", Role::Parent).await;
    let ideas = IdeaRepository::new(Arc::clone(&store));
    let comments = CommentRepository::new(Arc::clone(&store));

    let idea = ideas
        .create(
            submission("School garden", "Raised beds behind the east wing."),
            &author,
        )
        .await
        .unwrap();
    comments.create(idea.id, "I can bring seeds", &lena).await.unwrap();
    comments.create(idea.id, "Count me in", &lena).await.unwrap();
    comments.create(idea.id, "Happy to help water", &marat).await.unwrap();

    ideas.delete(idea.id, &author).await.unwrap();

    assert!(comments.list(idea.id).await.unwrap().is_empty());
    assert_eq!(reload_user(&store, lena.id).await.comments_count, 0);
    assert_eq!(reload_user(&store, marat.id).await.comments_count, 0);
    assert_eq!(reload_user(&store, author.id).await.ideas_count, 0);
}

#[tokio::test]
async fn triage_is_admin_only_and_persists() {
    let store = memory_store();
    let author = seed_user(&store, "Anya", Role::Student).await;
    let teacher = seed_user(&store, "Clara", Role::Teacher).await;
    let admin = seed_user(&store, "Office", Role::Admin).await;
    let ideas = IdeaRepository::new(Arc::clone(&store));

    let idea = ideas
        .create(
            submission("Recycling bins", "Paper and plastic on every floor."),
            &author,
        )
        .await
        .unwrap();

    let err = ideas
        .update_status(idea.id, Status::Approved, &teacher)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(reload_idea(&store, idea.id).await.status, Status::Pending);

    ideas
        .update_status(idea.id, Status::Approved, &admin)
        .await
        .unwrap();
    let after = reload_idea(&store, idea.id).await;
    assert_eq!(after.status, Status::Approved);
    assert!(after.updated_at > idea.updated_at);

    let err = ideas
        .update_status(Uuid::now_v7(), Status::Rejected, &admin)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("idea", _)));
}

#[tokio::test]
async fn view_increments_are_best_effort() {
    let store = memory_store();
    let author = seed_user(&store, "Anya", Role::Student).await;
    let ideas = IdeaRepository::new(Arc::clone(&store));

    // A missing idea is quietly ignored.
    ideas.increment_views(Uuid::now_v7()).await;

    let idea = ideas
        .create(
            submission("Board games shelf", "Leave games in the common room."),
            &author,
        )
        .await
        .unwrap();
    ideas.increment_views(idea.id).await;
    ideas.increment_views(idea.id).await;
    assert_eq!(reload_idea(&store, idea.id).await.views, 2);
}

#[tokio::test]
async fn counters_do_not_drop_below_zero() {
    let store = memory_store();
    let author = seed_user(&store, "Anya", Role::Student).await;
    let ideas = IdeaRepository::new(Arc::clone(&store));

    let idea = ideas
        .create(
            submission("Lost and found", "A labelled shelf by reception."),
            &author,
        )
        .await
        .unwrap();

    // Force the author counter to zero, then delete: it stays at zero.
    store
        .update(
            collections::USERS,
            &author.id.to_string(),
            Patch::new().set("ideasCount", serde_json::json!(0)),
        )
        .await
        .unwrap();
    ideas.delete(idea.id, &author).await.unwrap();
    assert_eq!(reload_user(&store, author.id).await.ideas_count, 0);
}
