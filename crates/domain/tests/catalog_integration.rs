//! Integration tests for catalog search and product administration.

use chrono::{Duration, Utc};
use common::{Caller, CategoryId, Money, ProductId, UserId};
use document_store::{Document, DocumentStore, InMemoryDocumentStore};
use domain::{
    CatalogQuery, CatalogService, CatalogSort, DomainError, Entity, ErrorKind, Gender, ImageStore,
    ImageUpload, Product, ProductDraft, ProductPatch,
};

fn admin() -> Caller {
    Caller::admin(UserId::new())
}

fn draft(name: &str, gender: &str, units: i64) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        gender: gender.to_string(),
        price: Money::from_units(units),
        ..Default::default()
    }
}

/// Inserts a product directly with a chosen creation time.
async fn seed(store: &InMemoryDocumentStore, product: ProductDraft, minutes_ago: i64) -> Product {
    let mut product = Product::from_draft(product).unwrap();
    product.created_at = Utc::now() - Duration::minutes(minutes_ago);
    let document = Document::builder()
        .id(product.id.as_uuid())
        .collection(Product::COLLECTION)
        .created_at(product.created_at)
        .body(&product)
        .unwrap()
        .try_build()
        .unwrap();
    store.insert(document).await.unwrap();
    product
}

mod search {
    use super::*;

    #[tokio::test]
    async fn price_ascending_first_page_of_twenty_five() {
        let store = InMemoryDocumentStore::new();
        for i in 0..25 {
            // Prices out of insertion order
            let units = (i * 7) % 25 + 1;
            seed(&store, draft(&format!("Shoe {i}"), "Male", units), i).await;
        }
        let catalog = CatalogService::new(store);

        let page = catalog
            .search(
                &CatalogQuery::new()
                    .sort(CatalogSort::PriceAsc)
                    .page(1)
                    .page_size(10),
            )
            .await
            .unwrap();

        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_count, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 10);
        let prices: Vec<_> = page.items.iter().map(|p| p.price.units()).collect();
        assert_eq!(prices, (1..=10).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn default_sort_is_newest_first() {
        let store = InMemoryDocumentStore::new();
        seed(&store, draft("old", "Male", 10), 60).await;
        seed(&store, draft("new", "Male", 10), 1).await;
        seed(&store, draft("mid", "Male", 10), 30).await;
        let catalog = CatalogService::new(store);

        let page = catalog.search(&CatalogQuery::new()).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(names, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn price_descending() {
        let store = InMemoryDocumentStore::new();
        for units in [20, 90, 50] {
            seed(&store, draft("s", "Female", units), 0).await;
        }
        let catalog = CatalogService::new(store);

        let page = catalog
            .search(&CatalogQuery::new().sort(CatalogSort::PriceDesc))
            .await
            .unwrap();
        let prices: Vec<_> = page.items.iter().map(|p| p.price.units()).collect();

        assert_eq!(prices, vec![90, 50, 20]);
    }

    #[tokio::test]
    async fn page_beyond_end_is_empty_with_accurate_total() {
        let store = InMemoryDocumentStore::new();
        for i in 0..5 {
            seed(&store, draft(&format!("s{i}"), "Male", 10), i).await;
        }
        let catalog = CatalogService::new(store);

        let page = catalog
            .search(&CatalogQuery::new().page(9).page_size(2))
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 9);

        let last = catalog
            .search(&CatalogQuery::new().page(i64::MAX).page_size(2))
            .await
            .unwrap();
        assert!(last.items.is_empty());
        assert_eq!(last.total_count, 5);
    }

    #[tokio::test]
    async fn oversized_page_is_clamped_to_fifty() {
        let store = InMemoryDocumentStore::new();
        for i in 0..60 {
            seed(&store, draft(&format!("s{i}"), "Male", 10), i).await;
        }
        let catalog = CatalogService::new(store);

        let page = catalog
            .search(&CatalogQuery::new().page_size(500))
            .await
            .unwrap();

        assert_eq!(page.page_size, 50);
        assert_eq!(page.items.len(), 50);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn text_matches_name_or_description_ignoring_case() {
        let store = InMemoryDocumentStore::new();
        seed(&store, draft("Air RUNNER", "Male", 10), 0).await;
        seed(
            &store,
            ProductDraft {
                description: "a trail runner for mud".to_string(),
                ..draft("Mudder", "Female", 10)
            },
            0,
        )
        .await;
        seed(&store, draft("Sandal", "Female", 10), 0).await;
        let catalog = CatalogService::new(store);

        let page = catalog
            .search(&CatalogQuery::new().text("runner"))
            .await
            .unwrap();

        assert_eq!(page.total_count, 2);
    }

    #[tokio::test]
    async fn gender_and_category_filters_compose() {
        let store = InMemoryDocumentStore::new();
        let c1 = CategoryId::new();
        let c2 = CategoryId::new();
        let with = |name: &str, gender: &str, categories: Vec<CategoryId>| ProductDraft {
            categories,
            ..draft(name, gender, 10)
        };
        seed(&store, with("m-c1", "Male", vec![c1]), 0).await;
        seed(&store, with("m-c1c2", "Male", vec![c1, c2]), 0).await;
        seed(&store, with("m-c2", "Male", vec![c2]), 0).await;
        seed(&store, with("f-c1", "Female", vec![c1]), 0).await;
        seed(&store, with("f-none", "Female", vec![]), 0).await;
        let catalog = CatalogService::new(store);

        let both = catalog
            .search(&CatalogQuery::new().gender("Male").categories([c1]))
            .await
            .unwrap();
        let gender_only = catalog
            .search(&CatalogQuery::new().gender("Male"))
            .await
            .unwrap();
        let category_only = catalog
            .search(&CatalogQuery::new().categories([c1]))
            .await
            .unwrap();

        assert_eq!(both.total_count, 2);
        assert!(both
            .items
            .iter()
            .all(|p| p.gender == Gender::Male && p.categories.contains(&c1)));
        assert_eq!(gender_only.total_count, 3);
        assert_eq!(category_only.total_count, 3);
        assert!(gender_only.total_count >= both.total_count);
        assert!(category_only.total_count >= both.total_count);
    }

    #[tokio::test]
    async fn categories_use_or_semantics() {
        let store = InMemoryDocumentStore::new();
        let c1 = CategoryId::new();
        let c2 = CategoryId::new();
        for categories in [vec![c1], vec![c2], vec![]] {
            seed(
                &store,
                ProductDraft {
                    categories,
                    ..draft("s", "Male", 10)
                },
                0,
            )
            .await;
        }
        let catalog = CatalogService::new(store);

        let page = catalog
            .search(&CatalogQuery::new().categories([c1, c2]))
            .await
            .unwrap();

        assert_eq!(page.total_count, 2);
    }

    #[tokio::test]
    async fn unknown_gender_is_ignored() {
        let store = InMemoryDocumentStore::new();
        seed(&store, draft("m", "Male", 10), 0).await;
        seed(&store, draft("f", "Female", 10), 0).await;
        let catalog = CatalogService::new(store);

        let page = catalog
            .search(&CatalogQuery::new().gender("Unisex"))
            .await
            .unwrap();

        assert_eq!(page.total_count, 2);
    }

    #[tokio::test]
    async fn price_bounds_are_inclusive_and_inverted_range_is_empty() {
        let store = InMemoryDocumentStore::new();
        for units in [10, 20, 30, 40] {
            seed(&store, draft("s", "Male", units), 0).await;
        }
        let catalog = CatalogService::new(store);

        let inclusive = catalog
            .search(
                &CatalogQuery::new()
                    .min_price(Money::from_units(20))
                    .max_price(Money::from_units(30)),
            )
            .await
            .unwrap();
        let inverted = catalog
            .search(
                &CatalogQuery::new()
                    .min_price(Money::from_units(40))
                    .max_price(Money::from_units(10)),
            )
            .await
            .unwrap();
        let floor_only = catalog
            .search(&CatalogQuery::new().min_price(Money::from_units(25)))
            .await
            .unwrap();

        assert_eq!(inclusive.total_count, 2);
        assert_eq!(inverted.total_count, 0);
        assert!(inverted.items.is_empty());
        assert_eq!(floor_only.total_count, 2);
    }

    #[tokio::test]
    async fn unavailable_store_surfaces_service_unavailable() {
        let store = InMemoryDocumentStore::new();
        store.set_unavailable(true);
        let catalog = CatalogService::new(store);

        let err = catalog.search(&CatalogQuery::new()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    }
}

mod administration {
    use super::*;

    #[tokio::test]
    async fn create_update_get_delete() {
        let catalog = CatalogService::new(InMemoryDocumentStore::new());
        let admin = admin();

        let product = catalog
            .create_product(&admin, draft("Runner", "Male", 50))
            .await
            .unwrap();
        assert_eq!(catalog.get_product(product.id).await.unwrap(), product);

        let updated = catalog
            .update_product(
                &admin,
                product.id,
                ProductPatch {
                    description: Some("fast".to_string()),
                    gender: Some("Female".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description, "fast");
        assert_eq!(updated.gender, Gender::Female);
        assert_eq!(updated.price, Money::from_units(50));
        assert_eq!(catalog.get_product(product.id).await.unwrap(), updated);

        catalog.delete_product(&admin, product.id).await.unwrap();
        let err = catalog.get_product(product.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Product", .. }));
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let catalog = CatalogService::new(InMemoryDocumentStore::new());
        let admin = admin();
        let id = ProductId::new();

        let update = catalog
            .update_product(&admin, id, ProductPatch::default())
            .await
            .unwrap_err();
        let delete = catalog.delete_product(&admin, id).await.unwrap_err();

        assert_eq!(update.kind(), ErrorKind::NotFound);
        assert_eq!(delete.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn clients_cannot_manage_products() {
        let catalog = CatalogService::new(InMemoryDocumentStore::new());
        let client = Caller::client(UserId::new());

        let create = catalog
            .create_product(&client, draft("Runner", "Male", 50))
            .await
            .unwrap_err();
        let list = catalog.list_all_products(&client).await.unwrap_err();

        assert_eq!(create.kind(), ErrorKind::Forbidden);
        assert_eq!(list.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn list_all_is_newest_first_and_full_detail() {
        let store = InMemoryDocumentStore::new();
        seed(
            &store,
            ProductDraft {
                description: "older".to_string(),
                ..draft("a", "Male", 10)
            },
            10,
        )
        .await;
        seed(&store, draft("b", "Male", 10), 1).await;
        let catalog = CatalogService::new(store);

        let all = catalog.list_all_products(&admin()).await.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "b");
        assert_eq!(all[1].description, "older");
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_without_writing() {
        let store = InMemoryDocumentStore::new();
        let catalog = CatalogService::new(store.clone());

        let err = catalog
            .create_product(&admin(), draft("Runner", "Kids", 50))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(store.document_count(Product::COLLECTION).await, 0);
    }
}

mod images {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct RecordingImageStore {
        names: Mutex<Vec<String>>,
        /// Number of puts that succeed before the store starts failing.
        fail_after: Option<usize>,
    }

    #[async_trait]
    impl ImageStore for RecordingImageStore {
        async fn put(&self, file_name: &str, _bytes: &[u8]) -> Result<String, DomainError> {
            let mut names = self.names.lock().unwrap();
            if self.fail_after.is_some_and(|limit| names.len() >= limit) {
                return Err(std::io::Error::other("disk full").into());
            }
            names.push(file_name.to_string());
            Ok(format!("/uploads/{file_name}"))
        }

        async fn remove(&self, file_name: &str) -> Result<(), DomainError> {
            self.names.lock().unwrap().retain(|name| name != file_name);
            Ok(())
        }
    }

    #[tokio::test]
    async fn upload_returns_uris_in_order() {
        let catalog = CatalogService::new(InMemoryDocumentStore::new());
        let images = RecordingImageStore::default();

        let uris = catalog
            .upload_images(
                &admin(),
                &images,
                vec![
                    ImageUpload::new("Front View.png", "image/png", vec![1, 2]),
                    ImageUpload::new("side.webp", "image/webp", vec![3]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(uris.len(), 2);
        assert!(uris[0].starts_with("/uploads/front-view-"));
        assert!(uris[0].ends_with("-0.png"));
        assert!(uris[1].starts_with("/uploads/side-"));
        assert!(uris[1].ends_with("-1.webp"));
    }

    #[tokio::test]
    async fn invalid_batch_stores_nothing() {
        let catalog = CatalogService::new(InMemoryDocumentStore::new());
        let images = RecordingImageStore::default();

        let err = catalog
            .upload_images(
                &admin(),
                &images,
                vec![
                    ImageUpload::new("ok.png", "image/png", vec![1]),
                    ImageUpload::new("doc.pdf", "application/pdf", vec![1]),
                ],
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(images.names.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_store_removes_images_already_written() {
        let catalog = CatalogService::new(InMemoryDocumentStore::new());
        let images = RecordingImageStore {
            fail_after: Some(2),
            ..Default::default()
        };

        let err = catalog
            .upload_images(
                &admin(),
                &images,
                vec![
                    ImageUpload::new("a.png", "image/png", vec![1]),
                    ImageUpload::new("b.png", "image/png", vec![2]),
                    ImageUpload::new("c.png", "image/png", vec![3]),
                ],
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
        assert!(images.names.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clients_cannot_upload() {
        let catalog = CatalogService::new(InMemoryDocumentStore::new());
        let images = RecordingImageStore::default();

        let err = catalog
            .upload_images(
                &Caller::client(UserId::new()),
                &images,
                vec![ImageUpload::new("ok.png", "image/png", vec![1])],
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
