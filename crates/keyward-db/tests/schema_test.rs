//! Integration tests for document-store schema initialization using
//! in-memory SurrealDB.

use keyward_core::models::application::CreateApplication;
use keyward_core::repository::ApplicationRepository;
use keyward_db::DocumentStore;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn init_defines_tables_and_unique_indexes() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    let store = DocumentStore::init(db).await.unwrap();

    let mut result = store.client().query("INFO FOR DB").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info_str = format!("{:?}", info.expect("INFO FOR DB should return a value"));
    assert!(info_str.contains("application"), "missing application table");
    assert!(info_str.contains("role"), "missing role table");
    assert!(info_str.contains("_migration"), "missing _migration table");

    let mut result = store
        .client()
        .query("INFO FOR TABLE application")
        .await
        .unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    let info_str = format!("{:?}", info.unwrap());
    assert!(
        info_str.contains("idx_application_external_id"),
        "missing external_id unique index"
    );

    let mut result = store.client().query("INFO FOR TABLE role").await.unwrap();
    let info: Option<surrealdb_types::Value> = result.take(0).unwrap();
    assert!(format!("{:?}", info.unwrap()).contains("idx_role_tag"));
}

#[tokio::test]
async fn init_twice_keeps_data() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    let store = DocumentStore::init(db.clone()).await.unwrap();
    let id = store
        .applications()
        .create(CreateApplication::new("Service A", "svc-a").unwrap())
        .await
        .unwrap();

    // Second init hits the existing indexes; that is only a warning.
    let store = DocumentStore::init(db).await.unwrap();
    store.applications().ensure_schema().await.unwrap();

    let app = store.applications().get(id).await.unwrap();
    assert_eq!(app.external_id, "svc-a");

    let mut result = store
        .client()
        .query("SELECT * FROM _migration")
        .await
        .unwrap();
    let records: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert_eq!(records.len(), 1, "expected exactly one migration record");
}
