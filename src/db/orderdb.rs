// db/orderdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::ordermodel::{ConfirmedCharge, Order, ORDER_COLUMNS};

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct SellerStats {
    pub gig_count: i64,
    pub total_sales: i64,
    pub gross_revenue: f64,
    pub monthly_revenue: f64,
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct PlatformStats {
    pub user_count: i64,
    pub seller_count: i64,
    pub gig_count: i64,
    pub order_count: i64,
    pub monthly_revenue: f64,
}

#[async_trait]
pub trait OrderExt {
    /// Inserts the order for a confirmed charge. Returns `None` when an order
    /// with the same payment reference already exists.
    async fn record_order(
        &self,
        charge: &ConfirmedCharge,
        title: &str,
        img: Option<&str>,
    ) -> Result<Option<Order>, sqlx::Error>;

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error>;

    async fn get_order_by_reference(&self, reference: &str) -> Result<Option<Order>, sqlx::Error>;

    async fn get_user_orders(&self, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error>;

    /// Marks an open order completed and applies the optional rating to its gig.
    /// Returns `None` if the order was already completed.
    async fn complete_order(
        &self,
        order_id: Uuid,
        stars: Option<i32>,
    ) -> Result<Option<Order>, sqlx::Error>;

    async fn seller_stats(&self, seller_id: Uuid) -> Result<SellerStats, sqlx::Error>;

    async fn platform_stats(&self) -> Result<PlatformStats, sqlx::Error>;
}

#[async_trait]
impl OrderExt for DBClient {
    async fn record_order(
        &self,
        charge: &ConfirmedCharge,
        title: &str,
        img: Option<&str>,
    ) -> Result<Option<Order>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO orders (
                gig_id, title, img, price, currency, buyer_id, seller_id, gateway, payment_intent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (payment_intent) DO NOTHING
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(charge.gig_id)
            .bind(title)
            .bind(img)
            .bind(charge.amount)
            .bind(&charge.currency)
            .bind(charge.buyer_id)
            .bind(charge.seller_id)
            .bind(charge.gateway)
            .bind(&charge.reference)
            .fetch_optional(&mut *tx)
            .await?;

        if order.is_some() {
            sqlx::query(
                r#"
                UPDATE gigs
                SET sales = sales + 1,
                    sales_revenue = (sales + 1) * price,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(charge.gig_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
        sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_order_by_reference(&self, reference: &str) -> Result<Option<Order>, sqlx::Error> {
        let sql = format!("SELECT {} FROM orders WHERE payment_intent = $1", ORDER_COLUMNS);
        sqlx::query_as::<_, Order>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_orders(&self, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {} FROM orders
            WHERE buyer_id = $1 OR seller_id = $1
            ORDER BY created_at DESC
            "#,
            ORDER_COLUMNS
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn complete_order(
        &self,
        order_id: Uuid,
        stars: Option<i32>,
    ) -> Result<Option<Order>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE orders
            SET is_completed = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_completed = FALSE
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;

        if let (Some(order), Some(stars)) = (&order, stars) {
            sqlx::query(
                r#"
                UPDATE gigs
                SET total_stars = total_stars + $2,
                    star_number = star_number + 1,
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(order.gig_id)
            .bind(stars)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    async fn seller_stats(&self, seller_id: Uuid) -> Result<SellerStats, sqlx::Error> {
        sqlx::query_as::<_, SellerStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM gigs WHERE user_id = $1) AS gig_count,
                (SELECT COALESCE(SUM(sales), 0)::BIGINT FROM gigs WHERE user_id = $1) AS total_sales,
                (SELECT COALESCE(SUM(sales_revenue), 0)::DOUBLE PRECISION FROM gigs WHERE user_id = $1) AS gross_revenue,
                (
                    SELECT COALESCE(SUM(g.price), 0)::DOUBLE PRECISION
                    FROM orders o
                    JOIN gigs g ON g.id = o.gig_id
                    WHERE o.seller_id = $1
                      AND o.created_at >= date_trunc('month', NOW())
                ) AS monthly_revenue
            "#,
        )
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn platform_stats(&self) -> Result<PlatformStats, sqlx::Error> {
        sqlx::query_as::<_, PlatformStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS user_count,
                (SELECT COUNT(*) FROM users WHERE is_seller) AS seller_count,
                (SELECT COUNT(*) FROM gigs) AS gig_count,
                (SELECT COUNT(*) FROM orders) AS order_count,
                (
                    SELECT COALESCE(SUM(g.price), 0)::DOUBLE PRECISION
                    FROM orders o
                    JOIN gigs g ON g.id = o.gig_id
                    WHERE o.created_at >= date_trunc('month', NOW())
                ) AS monthly_revenue
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::{
        db::{
            fixtures::{seed_gig, seed_user},
            gigdb::GigExt,
        },
        models::ordermodel::PaymentGateway,
    };

    fn charge(reference: &str, gig_id: Uuid, buyer_id: Uuid, seller_id: Uuid) -> ConfirmedCharge {
        ConfirmedCharge {
            gateway: PaymentGateway::Paystack,
            reference: reference.to_string(),
            gig_id,
            buyer_id,
            seller_id,
            amount: 25.0,
            currency: "NGN".to_string(),
        }
    }

    #[sqlx::test]
    async fn test_same_reference_records_one_order(pool: PgPool) {
        let db = DBClient::new(pool);
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let gig = seed_gig(&db, seller.id, "Logo design", "design", 25.0).await;
        let charge = charge("GH-PS-0001", gig.id, buyer.id, seller.id);

        let first = db
            .record_order(&charge, &gig.title, Some(&gig.cover))
            .await
            .unwrap();
        let replay = db
            .record_order(&charge, &gig.title, Some(&gig.cover))
            .await
            .unwrap();

        let order = first.unwrap();
        assert!(replay.is_none());
        assert_eq!(order.payment_intent, "GH-PS-0001");
        assert!(!order.is_completed);

        let gig = db.get_gig(gig.id).await.unwrap().unwrap();
        assert_eq!(gig.sales, 1);
        assert_eq!(gig.sales_revenue, 25.0);
        assert_eq!(db.get_user_orders(buyer.id).await.unwrap().len(), 1);
        assert_eq!(
            db.get_order_by_reference("GH-PS-0001").await.unwrap().map(|o| o.id),
            Some(order.id)
        );
    }

    #[sqlx::test]
    async fn test_concurrent_deliveries_record_one_order(pool: PgPool) {
        let db = DBClient::new(pool);
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let gig = seed_gig(&db, seller.id, "Landing page", "web", 25.0).await;
        let charge = charge("GH-PS-0002", gig.id, buyer.id, seller.id);

        let (a, b) = tokio::join!(
            db.record_order(&charge, &gig.title, None),
            db.record_order(&charge, &gig.title, None)
        );

        let recorded = [a.unwrap(), b.unwrap()].iter().filter(|o| o.is_some()).count();
        assert_eq!(recorded, 1);
        assert_eq!(db.get_gig(gig.id).await.unwrap().unwrap().sales, 1);
    }

    #[sqlx::test]
    async fn test_complete_order_rates_gig_once(pool: PgPool) {
        let db = DBClient::new(pool);
        let seller = seed_user(&db, "seller").await;
        let buyer = seed_user(&db, "buyer").await;
        let gig = seed_gig(&db, seller.id, "Copywriting", "writing", 25.0).await;
        let order = db
            .record_order(&charge("GH-PS-0003", gig.id, buyer.id, seller.id), &gig.title, None)
            .await
            .unwrap()
            .unwrap();

        let completed = db.complete_order(order.id, Some(4)).await.unwrap();
        assert!(completed.unwrap().is_completed);
        assert!(db.complete_order(order.id, Some(5)).await.unwrap().is_none());

        let gig = db.get_gig(gig.id).await.unwrap().unwrap();
        assert_eq!(gig.total_stars, 4);
        assert_eq!(gig.star_number, 1);

        let stats = db.seller_stats(seller.id).await.unwrap();
        assert_eq!(stats.gig_count, 1);
        assert_eq!(stats.total_sales, 1);
    }
}
