//! Article ratings walkthrough
//! Run with: cargo run --package votable-core --example rate_articles
//!
//! Uses `SURREALDB_URL` when set (plus the optional credentials
//! `SurrealVoteStore::from_env` reads), otherwise an in-memory engine.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use votable_core::{
    migrations, HostRef, SurrealVoteStore, Votable, VoteStore, VoteValidator, Voter,
};

struct Reader {
    id: String,
}

impl Reader {
    fn named(id: &str) -> Self {
        Reader { id: id.to_string() }
    }
}

impl Voter for Reader {
    fn voter_id(&self) -> &str {
        &self.id
    }

    fn voter_type(&self) -> &str {
        "reader"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load from environment
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .ok();

    let store = if std::env::var("SURREALDB_URL").is_ok() {
        SurrealVoteStore::from_env().await?
    } else {
        SurrealVoteStore::in_memory().await?
    };
    let store = Arc::new(store);

    migrations::init_votable_table(store.client(), "articles").await?;

    // Reset the demo document so the example can run repeatedly
    let host = HostRef::new("articles", "rust-in-prod");
    store
        .client()
        .query("DELETE type::thing($tb, $id)")
        .bind(("tb", host.table.clone()))
        .bind(("id", host.id.clone()))
        .await?
        .check()?;
    store
        .client()
        .query("CREATE type::thing($tb, $id) SET title = $title")
        .bind(("tb", host.table.clone()))
        .bind(("id", host.id.clone()))
        .bind(("title", "Rust in production".to_string()))
        .await?
        .check()?;
    println!("✓ Seeded article {host}");

    let validator = VoteValidator::with_range(1.0..=5.0);
    let mut article = Votable::hydrate(Arc::clone(&store), host.clone(), validator).await?;

    article.vote(5.0, &Reader::named("alice")).await?;
    article.vote(4.0, &Reader::named("bob")).await?;
    println!(
        "✓ Two ratings in: count={}, mean={:?}",
        article.vote_count(),
        article.vote_value()
    );

    match article.vote(9.0, &Reader::named("mallory")).await {
        Err(e) => println!("✓ Out-of-range rating refused: {e}"),
        Ok(()) => {
            eprintln!("✗ A rating of 9 should not pass a 1..=5 range");
            std::process::exit(1);
        }
    }

    article.retract(&Reader::named("alice")).await?;
    println!(
        "✓ Alice retracted: count={}, mean={:?}",
        article.vote_count(),
        article.vote_value()
    );

    let ranked = store.highest_voted("articles", 3).await?;
    println!("✓ Highest rated articles:");
    for (i, entry) in ranked.iter().enumerate() {
        println!("  {}. {}", i + 1, entry);
    }

    Ok(())
}
