use common::ProjectId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Money, Product, ProjectDetail};
use stores::{CatalogStore, InMemoryCatalogStore, InMemorySaleStore, SaleStore};

fn make_product(id: &str, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Producto {id}"),
        brand: None,
        image: None,
        category_ids: vec!["general".to_string()],
        project_details: vec![ProjectDetail {
            project_id: ProjectId::new("1"),
            purchase_price: Money::from_cents(800),
            sale_price: Money::from_cents(1000),
            wholesale_price: None,
            unit: None,
            stock,
        }],
    }
}

fn bench_conditional_decrement(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("stores/conditional_decrement", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryCatalogStore::new();
                store.upsert(make_product("P1", 1_000_000)).await.unwrap();
                store
                    .decrement_stock("P1", &ProjectId::new("1"), 1)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_sale_number_allocation(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("stores/sale_number_allocation", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemorySaleStore::new();
                for _ in 0..10 {
                    store.next_number(&ProjectId::new("1")).await.unwrap();
                }
            });
        });
    });
}

criterion_group!(benches, bench_conditional_decrement, bench_sale_number_allocation);
criterion_main!(benches);
