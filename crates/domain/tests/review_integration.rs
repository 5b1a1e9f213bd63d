//! Integration tests for reviews and rating-summary recomputation.

use async_trait::async_trait;
use common::{Caller, Money, ProductId, ReviewId, Role, UserId};
use document_store::{
    Document, DocumentId, DocumentQuery, DocumentStore, FieldFilter, InMemoryDocumentStore,
    NumericSummary,
};
use domain::{
    CatalogService, Entity, ErrorKind, Product, ProductDraft, RatingSummary, Review, ReviewService,
    UserService,
};

struct Fixture {
    store: InMemoryDocumentStore,
    catalog: CatalogService<InMemoryDocumentStore>,
    reviews: ReviewService<InMemoryDocumentStore>,
    users: UserService<InMemoryDocumentStore>,
    admin: Caller,
}

fn setup() -> Fixture {
    let store = InMemoryDocumentStore::new();
    Fixture {
        catalog: CatalogService::new(store.clone()),
        reviews: ReviewService::new(store.clone()),
        users: UserService::new(store.clone()),
        store,
        admin: Caller::admin(UserId::new()),
    }
}

/// Deletes a product just before any write to it, as if an administrator
/// removed it concurrently.
#[derive(Clone)]
struct ProductDeletedBeforeWrite(InMemoryDocumentStore);

#[async_trait]
impl DocumentStore for ProductDeletedBeforeWrite {
    async fn insert(&self, document: Document) -> document_store::Result<()> {
        self.0.insert(document).await
    }

    async fn replace(&self, document: Document) -> document_store::Result<bool> {
        if document.collection == Product::COLLECTION {
            self.0.delete(&document.collection, document.id).await?;
        }
        self.0.replace(document).await
    }

    async fn get(&self, collection: &str, id: DocumentId) -> document_store::Result<Option<Document>> {
        self.0.get(collection, id).await
    }

    async fn delete(
        &self,
        collection: &str,
        id: DocumentId,
    ) -> document_store::Result<Option<Document>> {
        self.0.delete(collection, id).await
    }

    async fn find(&self, query: DocumentQuery) -> document_store::Result<Vec<Document>> {
        self.0.find(query).await
    }

    async fn count(&self, collection: &str, filters: &[FieldFilter]) -> document_store::Result<u64> {
        self.0.count(collection, filters).await
    }

    async fn summarize(
        &self,
        collection: &str,
        filters: &[FieldFilter],
        field: &str,
    ) -> document_store::Result<NumericSummary> {
        self.0.summarize(collection, filters, field).await
    }
}

impl Fixture {
    async fn product(&self, name: &str) -> Product {
        self.catalog
            .create_product(
                &self.admin,
                ProductDraft {
                    name: name.to_string(),
                    gender: "Male".to_string(),
                    price: Money::from_units(80),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    async fn review(&self, product: ProductId, rating: i64) -> Review {
        let author = Caller::client(UserId::new());
        self.reviews
            .create_review(&author, product, rating, "ok")
            .await
            .unwrap()
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn create_trims_comment_and_lists_newest_first() {
        let fx = setup();
        let product = fx.product("Runner").await;
        let author = Caller::client(UserId::new());

        let first = fx
            .reviews
            .create_review(&author, product.id, 4, "  comfy  ")
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = fx.review(product.id, 2).await;

        assert_eq!(first.comment, "comfy");
        assert_eq!(first.rating.value(), 4);

        let listed = fx.reviews.reviews_for_product(product.id).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn second_review_by_same_author_conflicts() {
        let fx = setup();
        let product = fx.product("Runner").await;
        let author = Caller::client(UserId::new());

        fx.reviews
            .create_review(&author, product.id, 5, "great")
            .await
            .unwrap();
        let err = fx
            .reviews
            .create_review(&author, product.id, 1, "changed my mind")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(fx.store.document_count(Review::COLLECTION).await, 1);
    }

    #[tokio::test]
    async fn same_author_may_review_other_products() {
        let fx = setup();
        let a = fx.product("A").await;
        let b = fx.product("B").await;
        let author = Caller::client(UserId::new());

        fx.reviews.create_review(&author, a.id, 5, "").await.unwrap();
        fx.reviews.create_review(&author, b.id, 4, "").await.unwrap();

        assert_eq!(fx.store.document_count(Review::COLLECTION).await, 2);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_invalid() {
        let fx = setup();
        let product = fx.product("Runner").await;
        let author = Caller::client(UserId::new());

        for rating in [0, 6] {
            let err = fx
                .reviews
                .create_review(&author, product.id, rating, "")
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let fx = setup();
        let err = fx
            .reviews
            .create_review(&Caller::client(UserId::new()), ProductId::new(), 3, "")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn creation_does_not_touch_cached_summary() {
        let fx = setup();
        let product = fx.product("Runner").await;
        fx.review(product.id, 5).await;

        let stored = fx.catalog.get_product(product.id).await.unwrap();
        assert_eq!(stored.rating, 0.0);
        assert_eq!(stored.num_reviews, 0);
    }
}

mod aggregation {
    use super::*;

    #[tokio::test]
    async fn deleting_a_review_recomputes_the_summary() {
        let fx = setup();
        let product = fx.product("Runner").await;
        fx.review(product.id, 5).await;
        let three = fx.review(product.id, 3).await;
        fx.review(product.id, 4).await;

        let summary = fx.reviews.delete_review(&fx.admin, three.id).await.unwrap();

        assert_eq!(summary, RatingSummary { average: 4.5, count: 2 });
        let stored = fx.catalog.get_product(product.id).await.unwrap();
        assert_eq!(stored.rating, 4.5);
        assert_eq!(stored.num_reviews, 2);
    }

    #[tokio::test]
    async fn deleting_the_last_review_resets_to_zero() {
        let fx = setup();
        let product = fx.product("Runner").await;
        let only = fx.review(product.id, 2).await;

        let summary = fx.reviews.delete_review(&fx.admin, only.id).await.unwrap();

        assert_eq!(summary, RatingSummary { average: 0.0, count: 0 });
        let stored = fx.catalog.get_product(product.id).await.unwrap();
        assert_eq!(stored.rating, 0.0);
        assert_eq!(stored.num_reviews, 0);
    }

    #[tokio::test]
    async fn other_products_are_not_affected() {
        let fx = setup();
        let a = fx.product("A").await;
        let b = fx.product("B").await;
        let on_a = fx.review(a.id, 1).await;
        fx.review(a.id, 5).await;
        fx.review(b.id, 2).await;

        fx.reviews.delete_review(&fx.admin, on_a.id).await.unwrap();

        let b = fx.catalog.get_product(b.id).await.unwrap();
        assert_eq!(b.num_reviews, 0);
        let a = fx.catalog.get_product(a.id).await.unwrap();
        assert_eq!((a.rating, a.num_reviews), (5.0, 1));
    }

    #[tokio::test]
    async fn dangling_product_skips_the_write() {
        let fx = setup();
        let product = fx.product("Runner").await;
        let review = fx.review(product.id, 4).await;
        fx.review(product.id, 2).await;
        fx.catalog.delete_product(&fx.admin, product.id).await.unwrap();

        let summary = fx.reviews.delete_review(&fx.admin, review.id).await.unwrap();

        assert_eq!(summary, RatingSummary { average: 2.0, count: 1 });
        assert_eq!(fx.store.document_count(Product::COLLECTION).await, 0);
    }

    #[tokio::test]
    async fn product_deleted_during_recompute_still_returns_summary() {
        let fx = setup();
        let product = fx.product("Runner").await;
        let review = fx.review(product.id, 4).await;
        fx.review(product.id, 2).await;
        let reviews = ReviewService::new(ProductDeletedBeforeWrite(fx.store.clone()));

        let summary = reviews.delete_review(&fx.admin, review.id).await.unwrap();

        assert_eq!(summary, RatingSummary { average: 2.0, count: 1 });
        assert_eq!(fx.store.document_count(Review::COLLECTION).await, 1);
        assert_eq!(fx.store.document_count(Product::COLLECTION).await, 0);
    }

    #[tokio::test]
    async fn delete_requires_admin_and_existing_review() {
        let fx = setup();
        let product = fx.product("Runner").await;
        let review = fx.review(product.id, 4).await;

        let forbidden = fx
            .reviews
            .delete_review(&Caller::client(review.user_id), review.id)
            .await
            .unwrap_err();
        let missing = fx
            .reviews
            .delete_review(&fx.admin, ReviewId::new())
            .await
            .unwrap_err();

        assert_eq!(forbidden.kind(), ErrorKind::Forbidden);
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(fx.store.document_count(Review::COLLECTION).await, 1);
    }
}

mod product_listing {
    use super::*;

    #[tokio::test]
    async fn product_reviews_carry_author_email_when_known() {
        let fx = setup();
        let product = fx.product("Runner").await;
        let author = fx
            .users
            .register("Walker@Example.com", Role::Client)
            .await
            .unwrap();

        fx.reviews
            .create_review(&author.caller(), product.id, 5, "light")
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let anonymous = fx.review(product.id, 3).await;

        let listed = fx.reviews.reviews_for_product(product.id).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, anonymous.id);
        assert_eq!(listed[0].user_email, None);
        assert_eq!(listed[1].user_email.as_deref(), Some("walker@example.com"));
        assert_eq!(listed[1].comment, "light");
        assert!(
            listed
                .iter()
                .all(|r| r.product_name.as_deref() == Some("Runner"))
        );
    }

    #[tokio::test]
    async fn missing_product_lists_nothing() {
        let fx = setup();
        let listed = fx.reviews.reviews_for_product(ProductId::new()).await.unwrap();
        assert!(listed.is_empty());
    }
}

mod admin_listing {
    use super::*;

    #[tokio::test]
    async fn listing_joins_names_and_tolerates_dangling_references() {
        let fx = setup();
        let kept = fx.product("Kept").await;
        let doomed = fx.product("Doomed").await;
        let author = fx
            .users
            .register("reviewer@example.com", Role::Client)
            .await
            .unwrap();

        fx.reviews
            .create_review(&author.caller(), kept.id, 5, "nice")
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        fx.review(doomed.id, 1).await;
        fx.catalog.delete_product(&fx.admin, doomed.id).await.unwrap();

        let listing = fx.reviews.list_all_reviews(&fx.admin).await.unwrap();

        assert_eq!(listing.len(), 2);
        // Newest first: the anonymous review of the deleted product
        assert_eq!(listing[0].product_name, None);
        assert_eq!(listing[0].user_email, None);
        assert_eq!(listing[1].product_name.as_deref(), Some("Kept"));
        assert_eq!(listing[1].user_email.as_deref(), Some("reviewer@example.com"));
    }

    #[tokio::test]
    async fn listing_requires_admin() {
        let fx = setup();
        let err = fx
            .reviews
            .list_all_reviews(&Caller::client(UserId::new()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
