use small_backoffice::adapters::db;
use small_backoffice::config::{DatabaseConfig, ImportConfig};
use small_backoffice::domain::model::ImportMode;
use small_backoffice::{AppError, ReportImporter, SqlReportStore};
use tempfile::TempDir;

async fn setup(mode: ImportMode) -> (TempDir, SqlReportStore, ReportImporter<SqlReportStore>) {
    let temp_dir = TempDir::new().unwrap();
    let pool = db::connect(&DatabaseConfig::in_memory()).await.unwrap();
    let store = SqlReportStore::new(pool);

    let importer = ReportImporter::new(
        store.clone(),
        ImportConfig {
            base_dir: temp_dir.path().to_path_buf(),
            min_fields: 5,
            mode,
        },
    );
    (temp_dir, store, importer)
}

#[tokio::test]
async fn test_import_valid_report() {
    let (dir, store, importer) = setup(ImportMode::Abort).await;
    std::fs::write(
        dir.path().join("sales.csv"),
        "2024-01-01,north,widget,3,29.97\n2024-01-02,south,gadget,1,49.99\n",
    )
    .unwrap();

    let summary = importer.process_report("sales.csv").await.unwrap();

    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.duplicates, 0);
    assert!(summary.rejected.is_empty());
    assert_eq!(store.count_rows("sales.csv").await.unwrap(), 2);
}

#[tokio::test]
async fn test_short_row_aborts_without_persisting() {
    let (dir, store, importer) = setup(ImportMode::Abort).await;
    std::fs::write(
        dir.path().join("sales.csv"),
        "2024-01-01,north,widget,3,29.97\n2024-01-02,south\n",
    )
    .unwrap();

    let err = importer.process_report("sales.csv").await.unwrap_err();

    assert!(matches!(
        err,
        AppError::MalformedRow {
            line: 2,
            found: 2,
            expected: 5
        }
    ));
    assert_eq!(store.count_rows("sales.csv").await.unwrap(), 0);
}

#[tokio::test]
async fn test_short_row_skipped_is_not_persisted() {
    let (dir, store, importer) = setup(ImportMode::Skip).await;
    std::fs::write(
        dir.path().join("sales.csv"),
        "2024-01-01,north,widget,3,29.97\nbroken\n2024-01-03,east,gizmo,2,10.00\n",
    )
    .unwrap();

    let summary = importer.process_report("sales.csv").await.unwrap();

    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.rejected.len(), 1);
    assert_eq!(summary.rejected[0].line, 2);
    assert_eq!(store.count_rows("sales.csv").await.unwrap(), 2);
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let (dir, store, importer) = setup(ImportMode::Abort).await;
    std::fs::write(
        dir.path().join("sales.csv"),
        "2024-01-01,north,widget,3,29.97\n2024-01-02,south,gadget,1,49.99\n",
    )
    .unwrap();

    let first = importer.process_report("sales.csv").await.unwrap();
    let second = importer.process_report("sales.csv").await.unwrap();

    assert_eq!(first.inserted, 2);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(store.count_rows("sales.csv").await.unwrap(), 2);
}

#[tokio::test]
async fn test_reimport_with_dotted_path_is_idempotent() {
    let (dir, store, importer) = setup(ImportMode::Abort).await;
    std::fs::write(
        dir.path().join("r.csv"),
        "2024-01-01,north,widget,3,29.97\n2024-01-02,south,gadget,1,49.99\n",
    )
    .unwrap();

    let first = importer.process_report("r.csv").await.unwrap();
    let second = importer.process_report("./r.csv").await.unwrap();

    assert_eq!(first.inserted, 2);
    assert_eq!(second.source, "r.csv");
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(store.count_rows("r.csv").await.unwrap(), 2);
    assert_eq!(store.count_rows("./r.csv").await.unwrap(), 0);
}

#[tokio::test]
async fn test_rejected_line_after_blank_lines_matches_file() {
    let (dir, store, importer) = setup(ImportMode::Skip).await;
    std::fs::write(
        dir.path().join("gaps.csv"),
        "2024-01-01,north,widget,3,29.97\n\n\nbad,row\n2024-01-05,west,gizmo,1,9.99,\n",
    )
    .unwrap();

    let summary = importer.process_report("gaps.csv").await.unwrap();

    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.rejected.len(), 1);
    assert_eq!(summary.rejected[0].line, 4);
    assert_eq!(store.count_rows("gaps.csv").await.unwrap(), 2);
}

#[tokio::test]
async fn test_empty_file_imports_nothing() {
    let (dir, _store, importer) = setup(ImportMode::Abort).await;
    std::fs::write(dir.path().join("empty.csv"), "").unwrap();

    let summary = importer.process_report("empty.csv").await.unwrap();
    assert_eq!(summary.rows_read, 0);
    assert_eq!(summary.inserted, 0);
}
