//! # Ideaboard Binary
//!
//! Assembles the application from feature-selected plugins, then walks
//! the idea/vote/comment flow end to end against the assembled services.

use std::sync::Arc;

use ib_core::models::{Category, IdeaFilter, NewIdea, Role, Status};
use ib_core::traits::{DocumentStore, IdentityProvider};
use ib_services::{CommentRepository, IdeaRepository, ProfileManager, VoteCoordinator};

// Feature-gated imports: the binary is compiled to order.
#[cfg(feature = "store-memory")]
use ib_store_memory::MemoryStore;

#[cfg(feature = "auth-simple")]
use ib_auth_simple::SimpleIdentityProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = configs::AppConfig::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.log_filter)),
        )
        .init();

    // 1. Initialize the document store implementation
    #[cfg(feature = "store-memory")]
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());

    // 2. Initialize the identity provider implementation
    #[cfg(feature = "auth-simple")]
    let identity: Arc<dyn IdentityProvider> = Arc::new(SimpleIdentityProvider::new());

    // 3. Wire the services
    let profiles = ProfileManager::new(Arc::clone(&store));
    let ideas = IdeaRepository::new(Arc::clone(&store));
    let votes = VoteCoordinator::new(Arc::clone(&store));
    let comments = CommentRepository::new(Arc::clone(&store));

    tracing::info!("🚀 Ideaboard starting");

    // Sign everyone up the way a view layer would.
    let anya_principal = identity
        .register("anya@school.example", "sunflower", Some("Anya"))
        .await?;
    let anya = profiles
        .register_profile(&anya_principal, "Anya", Role::Student)
        .await?;

    let boris_principal = identity
        .register("boris@school.example", "grapefruit", Some("Boris"))
        .await?;
    let boris = profiles
        .register_profile(&boris_principal, "Boris", Role::Student)
        .await?;

    let clara_principal = identity
        .register("clara@school.example", "chalkboard", None)
        .await?;
    let clara = profiles
        .register_profile(&clara_principal, "Clara", Role::Teacher)
        .await?;

    let admin_principal = identity
        .register("office@school.example", "corridors", None)
        .await?;
    let admin = profiles
        .register_profile(&admin_principal, "Head office", Role::Admin)
        .await?;

    // A later sign-in resolves to the same profile.
    let signed_in = identity
        .authenticate("anya@school.example", "sunflower")
        .await?;
    let anya_again = profiles.ensure_profile(&signed_in).await?;
    anyhow::ensure!(anya_again.id == anya.id, "ensure_profile must be idempotent");

    // A signed-out session is blocked before any store work.
    if let Err(err) = ib_core::policy::require_principal(None) {
        tracing::info!(%err, "anonymous action blocked");
    }

    let idea = ideas
        .create(
            NewIdea {
                title: "Meat-free Mondays".into(),
                description: "One vegetarian day a week in the canteen.".into(),
                category: Category::Food,
            },
            &anya,
        )
        .await?;
    tracing::info!(title = %idea.title, "idea submitted");

    let on = votes.toggle_vote(idea.id, &boris).await?;
    tracing::info!(votes = on.votes_count, "Boris voted");
    let off = votes.toggle_vote(idea.id, &boris).await?;
    tracing::info!(votes = off.votes_count, "Boris changed his mind");
    votes.toggle_vote(idea.id, &boris).await?;

    let comment = comments
        .create(idea.id, "Could we start with Fridays instead?", &clara)
        .await?;
    tracing::info!(comment = %comment.text, "Clara commented");
    ideas.increment_views(idea.id).await;

    ideas.update_status(idea.id, Status::Approved, &admin).await?;
    match ideas.update_status(idea.id, Status::Rejected, &clara).await {
        Err(err) => tracing::info!(%err, "non-admin triage rejected, as it should be"),
        Ok(()) => anyhow::bail!("authorization should have blocked a non-admin"),
    }

    let filter = IdeaFilter {
        limit: cfg.list_limit,
        ..IdeaFilter::default()
    };
    for idea in ideas.list(&filter).await? {
        tracing::info!(
            title = %idea.title,
            status = idea.status.label(),
            votes = idea.votes_count,
            comments = idea.comments_count,
            views = idea.views,
            "board entry"
        );
    }

    Ok(())
}
