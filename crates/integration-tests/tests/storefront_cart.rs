//! End-to-end cart flow: browse, add, change quantities, check out.
//!
//! Each test starts its own fake backend and storefront (see
//! `meeple_integration_tests::TestContext`).

#![allow(clippy::unwrap_used)]

use meeple_integration_tests::{TestContext, new_client};
use reqwest::{Response, StatusCode, header};

fn location(resp: &Response) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Submit the detail page's add-to-cart form.
async fn add_to_cart(ctx: &TestContext, handle: &str, variant_id: &str, quantity: u32) -> Response {
    ctx.client
        .post(ctx.url(&format!("/games/{handle}/cart")))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(format!("variant_id={variant_id}&quantity={quantity}"))
        .send()
        .await
        .unwrap()
}

/// Submit a quantity change the way the cart page's buttons do.
async fn set_quantity(ctx: &TestContext, line_id: &str, quantity: u32, htmx: bool) -> Response {
    let mut request = ctx
        .client
        .post(ctx.url(&format!("/cart/lines/{line_id}")))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(format!("quantity={quantity}"));
    if htmx {
        request = request.header("HX-Request", "true");
    }
    request.send().await.unwrap()
}

async fn badge(ctx: &TestContext) -> String {
    let (status, body) = ctx.get_page("/cart/count").await;
    assert_eq!(status, StatusCode::OK);
    body.trim().to_string()
}

#[tokio::test]
async fn test_browsing_never_creates_a_cart() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx.get_page("/").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = ctx.get_page("/games").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(badge(&ctx).await, "0");

    let resp = ctx.client.get(ctx.url("/checkout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart");

    assert_eq!(ctx.backend.calls().create, 0);
}

#[tokio::test]
async fn test_add_to_cart_creates_one_cart_and_redirects() {
    let ctx = TestContext::new().await;

    let resp = add_to_cart(&ctx, "catan", "variant-catan", 2).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart");

    let resp = add_to_cart(&ctx, "azul", "variant-azul", 1).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    assert_eq!(ctx.backend.calls().create, 1);
    assert_eq!(ctx.backend.cart_ids(), vec!["cart-1".to_string()]);
    assert_eq!(
        ctx.backend.lines("cart-1"),
        vec![
            ("cart-1-line-1".to_string(), 2),
            ("cart-1-line-2".to_string(), 1),
        ]
    );
    assert_eq!(badge(&ctx).await, "3");
}

#[tokio::test]
async fn test_cart_page_shows_totals_with_shipping() {
    let ctx = TestContext::new().await;
    add_to_cart(&ctx, "catan", "variant-catan", 2).await;

    let (status, body) = ctx.get_page("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Catan"));
    assert!(body.contains("2 items"));
    // 2 x $49.99 + $5.99 shipping
    assert!(body.contains("$99.98"));
    assert!(body.contains("$5.99"));
    assert!(body.contains("$105.97"));
    assert!(body.contains("/cart/lines/cart-1-line-1"));
}

#[tokio::test]
async fn test_add_clamps_to_stock() {
    let ctx = TestContext::new().await;

    add_to_cart(&ctx, "azul", "variant-azul", 10).await;

    assert_eq!(
        ctx.backend.lines("cart-1"),
        vec![("cart-1-line-1".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_add_sold_out_game_returns_to_detail_page() {
    let ctx = TestContext::new().await;

    let resp = add_to_cart(&ctx, "wingspan", "variant-wingspan", 1).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/games/wingspan?error=add");

    let (_, body) = ctx.get_page("/games/wingspan?error=add").await;
    assert!(body.contains("Error adding to cart"));
    assert!(body.contains("Out of stock"));
    assert!(ctx.backend.lines("cart-1").is_empty());
}

#[tokio::test]
async fn test_add_with_foreign_variant_is_refused() {
    let ctx = TestContext::new().await;

    let resp = add_to_cart(&ctx, "catan", "variant-azul", 1).await;
    assert_eq!(location(&resp), "/games/catan?error=add");
    assert_eq!(ctx.backend.calls().add, 0);
}

#[tokio::test]
async fn test_htmx_quantity_change_returns_fragment_and_trigger() {
    let ctx = TestContext::new().await;
    add_to_cart(&ctx, "catan", "variant-catan", 1).await;

    let resp = set_quantity(&ctx, "cart-1-line-1", 3, true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("HX-Trigger").unwrap().to_str().unwrap(),
        "cart-updated"
    );
    let body = resp.text().await.unwrap();
    assert!(body.contains("id=\"cart-lines\""));
    assert!(body.contains("$149.97"));
    assert!(!body.contains("<html"));

    assert_eq!(
        ctx.backend.lines("cart-1"),
        vec![("cart-1-line-1".to_string(), 3)]
    );
    assert_eq!(ctx.backend.calls().update, 1);
}

#[tokio::test]
async fn test_quantity_zero_and_remove_both_delete_the_line() {
    let ctx = TestContext::new().await;
    add_to_cart(&ctx, "catan", "variant-catan", 1).await;
    add_to_cart(&ctx, "azul", "variant-azul", 1).await;

    let resp = set_quantity(&ctx, "cart-1-line-1", 0, true).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ctx
        .client
        .post(ctx.url("/cart/lines/cart-1-line-2/remove"))
        .header("HX-Request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Your cart is empty"));

    assert!(ctx.backend.lines("cart-1").is_empty());
    assert_eq!(ctx.backend.calls().remove, 2);
    assert_eq!(ctx.backend.calls().update, 0);
    assert_eq!(badge(&ctx).await, "0");
}

#[tokio::test]
async fn test_plain_form_quantity_change_redirects() {
    let ctx = TestContext::new().await;
    add_to_cart(&ctx, "catan", "variant-catan", 1).await;

    let resp = set_quantity(&ctx, "cart-1-line-1", 2, false).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart");
}

#[tokio::test]
async fn test_rejected_change_shows_inline_error() {
    let ctx = TestContext::new().await;
    add_to_cart(&ctx, "catan", "variant-catan", 1).await;
    ctx.backend.reject_mutations("Line no longer exists");

    let resp = set_quantity(&ctx, "cart-1-line-1", 2, true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("HX-Retarget").unwrap().to_str().unwrap(),
        "#cart-error"
    );
    assert!(resp.text().await.unwrap().contains("Error updating cart"));

    let resp = set_quantity(&ctx, "cart-1-line-1", 2, false).await;
    assert_eq!(location(&resp), "/cart?error=update");

    assert_eq!(
        ctx.backend.lines("cart-1"),
        vec![("cart-1-line-1".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_change_without_cart_shows_inline_error() {
    let ctx = TestContext::new().await;

    let resp = set_quantity(&ctx, "cart-1-line-1", 2, true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("HX-Retarget").is_some());
    assert_eq!(ctx.backend.calls().update, 0);
}

#[tokio::test]
async fn test_checkout_redirects_to_platform() {
    let ctx = TestContext::new().await;
    add_to_cart(&ctx, "catan", "variant-catan", 1).await;

    let resp = ctx.client.get(ctx.url("/checkout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&resp),
        format!("{}/checkout/cart-1", ctx.backend.url)
    );
}

#[tokio::test]
async fn test_expired_cart_is_replaced() {
    let ctx = TestContext::new().await;
    add_to_cart(&ctx, "catan", "variant-catan", 1).await;
    ctx.backend.expire("cart-1");

    assert_eq!(badge(&ctx).await, "0");

    let (status, body) = ctx.get_page("/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Your cart is empty"));
    assert_eq!(ctx.backend.cart_ids(), vec!["cart-2".to_string()]);

    add_to_cart(&ctx, "azul", "variant-azul", 1).await;
    assert_eq!(
        ctx.backend.lines("cart-2"),
        vec![("cart-2-line-1".to_string(), 1)]
    );
}

#[tokio::test]
async fn test_visitors_get_separate_carts() {
    let ctx = TestContext::new().await;
    add_to_cart(&ctx, "catan", "variant-catan", 1).await;

    let other = new_client();
    let resp = other
        .post(ctx.url("/games/azul/cart"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("variant_id=variant-azul&quantity=1")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    assert_eq!(
        ctx.backend.cart_ids(),
        vec!["cart-1".to_string(), "cart-2".to_string()]
    );
    assert_eq!(ctx.backend.lines("cart-1").len(), 1);
    assert_eq!(ctx.backend.lines("cart-2").len(), 1);
}
