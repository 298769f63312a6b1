// db/gigdb.rs
use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::db::DBClient;
use crate::{
    dtos::gigdtos::{CreateGigDto, GigQueryDto, GigSort},
    models::gigmodel::{Gig, GIG_COLUMNS},
};

#[async_trait]
pub trait GigExt {
    async fn create_gig(&self, user_id: Uuid, body: CreateGigDto) -> Result<Gig, sqlx::Error>;

    async fn get_gig(&self, gig_id: Uuid) -> Result<Option<Gig>, sqlx::Error>;

    async fn get_gigs(&self, query: &GigQueryDto) -> Result<Vec<Gig>, sqlx::Error>;

    async fn delete_gig(&self, gig_id: Uuid) -> Result<u64, sqlx::Error>;
}

#[async_trait]
impl GigExt for DBClient {
    async fn create_gig(&self, user_id: Uuid, body: CreateGigDto) -> Result<Gig, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO gigs (
                user_id, title, description, category, price, cover, images,
                short_title, short_desc, delivery_time, revision_number, features
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            GIG_COLUMNS
        );

        sqlx::query_as::<_, Gig>(&sql)
            .bind(user_id)
            .bind(body.title)
            .bind(body.description)
            .bind(body.category)
            .bind(body.price)
            .bind(body.cover)
            .bind(body.images)
            .bind(body.short_title)
            .bind(body.short_desc)
            .bind(body.delivery_time)
            .bind(body.revision_number)
            .bind(body.features)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_gig(&self, gig_id: Uuid) -> Result<Option<Gig>, sqlx::Error> {
        let sql = format!("SELECT {} FROM gigs WHERE id = $1", GIG_COLUMNS);
        sqlx::query_as::<_, Gig>(&sql)
            .bind(gig_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_gigs(&self, query: &GigQueryDto) -> Result<Vec<Gig>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM gigs WHERE TRUE", GIG_COLUMNS));

        if let Some(user_id) = query.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(cat) = &query.cat {
            builder.push(" AND category = ").push_bind(cat.clone());
        }
        if let Some(min) = query.min {
            builder.push(" AND price >= ").push_bind(min);
        }
        if let Some(max) = query.max {
            builder.push(" AND price <= ").push_bind(max);
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            builder
                .push(" AND title ILIKE ")
                .push_bind(format!("%{}%", search.trim()));
        }

        builder.push(match query.sort {
            GigSort::CreatedAt => " ORDER BY created_at DESC",
            GigSort::Sales => " ORDER BY sales DESC, created_at DESC",
            GigSort::Price => " ORDER BY price ASC, created_at DESC",
        });

        let limit = query.limit.unwrap_or(20) as i64;
        let offset = (query.page.unwrap_or(1).max(1) as i64 - 1) * limit;
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        builder.build_query_as::<Gig>().fetch_all(&self.pool).await
    }

    async fn delete_gig(&self, gig_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM gigs WHERE id = $1")
            .bind(gig_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::db::fixtures::{gig_body, seed_gig, seed_user};

    #[sqlx::test]
    async fn test_create_then_get_round_trip(pool: PgPool) {
        let db = DBClient::new(pool);
        let seller = seed_user(&db, "seller").await;

        let created = db
            .create_gig(seller.id, gig_body("Logo design", "design", 40.0))
            .await
            .unwrap();
        let fetched = db.get_gig(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.user_id, seller.id);
        assert_eq!(fetched.title, "Logo design");
        assert_eq!(fetched.price, 40.0);
        assert_eq!(fetched.features, vec!["Source files".to_string()]);
        assert_eq!(fetched.sales, 0);
        assert_eq!(fetched.average_rating(), None);
    }

    #[sqlx::test]
    async fn test_filters_and_price_sort(pool: PgPool) {
        let db = DBClient::new(pool);
        let ada = seed_user(&db, "ada").await;
        let bola = seed_user(&db, "bola").await;
        seed_gig(&db, ada.id, "Logo design", "design", 40.0).await;
        seed_gig(&db, ada.id, "Brand guide", "design", 90.0).await;
        seed_gig(&db, bola.id, "Landing page", "web", 150.0).await;

        let mine = db
            .get_gigs(&GigQueryDto {
                user_id: Some(bola.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Landing page");

        let design_by_price = db
            .get_gigs(&GigQueryDto {
                cat: Some("design".to_string()),
                max: Some(100.0),
                sort: GigSort::Price,
                ..Default::default()
            })
            .await
            .unwrap();
        let titles: Vec<_> = design_by_price.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, vec!["Logo design", "Brand guide"]);

        let searched = db
            .get_gigs(&GigQueryDto {
                search: Some(" LOGO ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);

        assert_eq!(db.delete_gig(searched[0].id).await.unwrap(), 1);
        assert!(db.get_gig(searched[0].id).await.unwrap().is_none());
    }
}
