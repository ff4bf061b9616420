//! Test Helpers
//!
//! Fixtures for data owned by other parts of the platform (users, projects,
//! the catalog) are inserted directly.

use jiff::civil::Date;
use jiff_sqlx::Date as SqlxDate;
use sqlx::query;

use crate::{
    domain::{
        email_promotions::records::EmailPromotionUuid,
        orders::records::{OrderItemUuid, OrderUuid},
        products::records::{ProductKind, ProductUuid},
        projects::records::ProjectUuid,
        users::records::UserUuid,
    },
    test::TestContext,
};

pub(crate) async fn create_user(
    ctx: &TestContext,
    nickname: &str,
    email: Option<&str>,
) -> Result<UserUuid, sqlx::Error> {
    let uuid = UserUuid::new();

    query("INSERT INTO users (uuid, nickname, email) VALUES ($1, $2, $3)")
        .bind(uuid.into_uuid())
        .bind(nickname)
        .bind(email)
        .execute(ctx.db.pool())
        .await?;

    Ok(uuid)
}

pub(crate) async fn opt_out(ctx: &TestContext, user: UserUuid) -> Result<(), sqlx::Error> {
    query("UPDATE users SET email_opt_out = TRUE WHERE uuid = $1")
        .bind(user.into_uuid())
        .execute(ctx.db.pool())
        .await?;

    Ok(())
}

pub(crate) async fn create_project(
    ctx: &TestContext,
    creator: UserUuid,
    name: &str,
) -> Result<ProjectUuid, sqlx::Error> {
    let uuid = ProjectUuid::new();

    query(
        "INSERT INTO projects (uuid, creator_uuid, name, description) \
         VALUES ($1, $2, $3, 'A project looking for collaborators')",
    )
    .bind(uuid.into_uuid())
    .bind(creator.into_uuid())
    .bind(name)
    .execute(ctx.db.pool())
    .await?;

    Ok(uuid)
}

pub(crate) async fn create_product(
    ctx: &TestContext,
    kind: ProductKind,
    name: &str,
    price: i64,
) -> Result<ProductUuid, sqlx::Error> {
    let uuid = ProductUuid::new();

    query("INSERT INTO products (uuid, kind, name, price) VALUES ($1, $2, $3, $4)")
        .bind(uuid.into_uuid())
        .bind(kind.as_str())
        .bind(name)
        .bind(price)
        .execute(ctx.db.pool())
        .await?;

    Ok(uuid)
}

/// Settle an order without going through a gateway notification.
pub(crate) async fn mark_order_paid(ctx: &TestContext, order: OrderUuid) -> Result<(), sqlx::Error> {
    query("UPDATE orders SET status = 'paid', paid_at = now(), updated_at = now() WHERE uuid = $1")
        .bind(order.into_uuid())
        .execute(ctx.db.pool())
        .await?;

    Ok(())
}

pub(crate) async fn paid_balance(ctx: &TestContext, user: UserUuid) -> Result<i64, sqlx::Error> {
    let balance: Option<i64> =
        sqlx::query_scalar("SELECT paid_balance FROM quota_ledgers WHERE user_uuid = $1")
            .bind(user.into_uuid())
            .fetch_optional(ctx.db.pool())
            .await?;

    Ok(balance.unwrap_or_default())
}

pub(crate) async fn count_entitlements(
    ctx: &TestContext,
    order: OrderUuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM service_entitlements WHERE order_uuid = $1")
        .bind(order.into_uuid())
        .fetch_one(ctx.db.pool())
        .await
}

pub(crate) async fn set_ledger(
    ctx: &TestContext,
    user: UserUuid,
    paid_balance: i64,
    free_used_today: u32,
    last_activity_date: Option<Date>,
) -> Result<(), sqlx::Error> {
    query(
        "INSERT INTO quota_ledgers (user_uuid, paid_balance, free_used_today, last_activity_date) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_uuid) DO UPDATE \
         SET paid_balance = EXCLUDED.paid_balance, \
             free_used_today = EXCLUDED.free_used_today, \
             last_activity_date = EXCLUDED.last_activity_date",
    )
    .bind(user.into_uuid())
    .bind(paid_balance)
    .bind(i32::try_from(free_used_today).unwrap_or(i32::MAX))
    .bind(last_activity_date.map(SqlxDate::from))
    .execute(ctx.db.pool())
    .await?;

    Ok(())
}

/// A pending promotion for a paid order whose creator has an email address.
pub(crate) struct PromotionFixture {
    pub creator: UserUuid,
    pub creator_email: String,
    pub project: ProjectUuid,
    pub order: OrderUuid,
    pub promotion: EmailPromotionUuid,
}

pub(crate) async fn create_paid_promotion(
    ctx: &TestContext,
    max_recipients: i32,
) -> Result<PromotionFixture, sqlx::Error> {
    let creator_email = "creator@example.com".to_string();
    let creator = create_user(ctx, "creator", Some(&creator_email)).await?;
    let project = create_project(ctx, creator, "Trellis").await?;
    let product = create_product(ctx, ProductKind::ServiceEntitlement, "Promotion emails", 10).await?;

    let order = OrderUuid::new();

    query(
        "INSERT INTO orders (uuid, user_uuid, total, status, paid_at) \
         VALUES ($1, $2, $3, 'paid', now())",
    )
    .bind(order.into_uuid())
    .bind(creator.into_uuid())
    .bind(i64::from(max_recipients) * 10)
    .execute(ctx.db.pool())
    .await?;

    query(
        "INSERT INTO order_items \
         (uuid, order_uuid, position, product_uuid, product_name, product_kind, price, quantity) \
         VALUES ($1, $2, 0, $3, 'Promotion emails', 'service_entitlement', 10, $4)",
    )
    .bind(OrderItemUuid::new().into_uuid())
    .bind(order.into_uuid())
    .bind(product.into_uuid())
    .bind(max_recipients)
    .execute(ctx.db.pool())
    .await?;

    let promotion = EmailPromotionUuid::new();

    query(
        "INSERT INTO email_promotions (uuid, order_uuid, project_uuid, creator_uuid, max_recipients) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(promotion.into_uuid())
    .bind(order.into_uuid())
    .bind(project.into_uuid())
    .bind(creator.into_uuid())
    .bind(max_recipients)
    .execute(ctx.db.pool())
    .await?;

    Ok(PromotionFixture {
        creator,
        creator_email,
        project,
        order,
        promotion,
    })
}
