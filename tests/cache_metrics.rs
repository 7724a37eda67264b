mod support;

use std::collections::HashSet;
use std::sync::Arc;

use alumni::application::pagination::PageRequest;
use alumni::application::resource::list_query;
use alumni::application::resources::{ProductFilter, ProductInput, Products};
use alumni::cache::{
    CacheAside, CacheConfig, METRIC_CACHE_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE,
    METRIC_CACHE_MISS, MemoryStore,
};
use alumni::domain::types::ProductCategory;
use metrics_util::debugging::DebuggingRecorder;
use support::{FailingStore, TestApp};

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // miss, then hit, then invalidate on create
    let app = TestApp::with_cache(CacheAside::new(
        Arc::new(MemoryStore::new(&CacheConfig::default())),
        CacheConfig::default(),
    ));
    let seller = app.alumni("40001").await;
    let query = || {
        list_query::<Products>(
            PageRequest::default(),
            None,
            None,
            None,
            ProductFilter::default(),
        )
        .expect("list query")
    };
    app.state.products.list(query()).await.unwrap();
    app.state.products.list(query()).await.unwrap();
    app.state
        .products
        .create(
            &seller,
            ProductInput {
                name: "Batik Tulis".to_string(),
                description: "Batik tulis motif kampus".to_string(),
                price: Some(250_000.0),
                category: Some(ProductCategory::Produk),
                image_url: None,
            },
        )
        .await
        .unwrap();

    // backend failures are counted, not surfaced
    let broken = TestApp::with_store(Arc::new(FailingStore));
    assert_eq!(broken.state.products.list(query()).await.unwrap().meta.total, 0);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for metric in [
        METRIC_CACHE_HIT,
        METRIC_CACHE_MISS,
        METRIC_CACHE_INVALIDATE,
        METRIC_CACHE_ERROR,
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
