use actix_web::{test, web, App};
use cagematch::infra::state::build_state;
use cagematch::routes;
use migration::{migrate, MigrationCommand};
use serde_json::Value;

#[actix_web::test]
async fn health_reports_memory_storage() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state().build()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["app_version"], env!("CARGO_PKG_VERSION"));
    assert!(body.get("storage_error").is_none());
}

#[actix_web::test]
async fn health_reports_applied_migration() -> Result<(), Box<dyn std::error::Error>> {
    let db = migration::connect("sqlite::memory:").await?;
    migrate(&db, MigrationCommand::Up).await?;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(build_state().with_database(db).build()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["storage"], "ok");
    let migrations = body["migrations"].as_str().unwrap_or_default();
    assert!(migrations.starts_with('m'), "{migrations}");
    Ok(())
}
