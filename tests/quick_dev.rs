//! Smoke run against a live server: `cargo test -- --ignored --nocapture`.

use anyhow::Result;
use serde_json::json;

#[tokio::test]
#[ignore = "needs a running server on localhost:5000"]
async fn quick_dev() -> Result<()> {
    let hc = httpc_test::new_client("http://localhost:5000/api")?;

    hc.do_get("/blog/all").await?.print().await?;

    hc.do_post(
        "/auth/register",
        json!({
          "name": "John Doe",
          "email": "reader@example.com",
          "password": "123456",
        }),
    )
    .await?
    .print()
    .await?;

    hc.do_post(
        "/auth/login",
        json!({
          "email": "reader@example.com",
          "password": "123456",
        }),
    )
    .await?
    .print()
    .await?;

    // Reader session on an admin route.
    hc.do_get("/admin/blogs").await?.print().await?;

    hc.do_post(
        "/admin/login",
        json!({
          "email": "admin@example.com",
          "password": "admin-password",
        }),
    )
    .await?
    .print()
    .await?;

    hc.do_get("/admin/dashboard").await?.print().await?;
    hc.do_get("/admin/comments").await?.print().await?;

    hc.do_post("/blog/generate", json!({ "prompt": "Getting started with Rust" }))
        .await?
        .print()
        .await?;

    hc.do_post("/auth/logout", json!({})).await?.print().await?;

    Ok(())
}
