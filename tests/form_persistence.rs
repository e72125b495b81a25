//! Form Persistence Tests
//!
//! Records written through the form service survive a restart, keep their
//! revision sequence and refuse to load from a corrupted store file.

use std::fs;
use std::sync::Arc;

use serde_json::json;
use shipforms::forms::{FormKind, FormService};
use shipforms::storage::{FileStore, StorageErrorCode, STORE_FILE_NAME};
use shipforms::uploads::{LocalBackend, Upload, UploadService};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn open_service(dir: &TempDir) -> FormService {
    let store = FileStore::open(dir.path()).unwrap();
    let uploads =
        UploadService::new(LocalBackend::new(dir.path().join("uploads")), 1024 * 1024).unwrap();
    FormService::new(Arc::new(store), uploads)
}

fn store_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("data").join(STORE_FILE_NAME)
}

// =============================================================================
// Restart
// =============================================================================

#[test]
fn test_revisions_continue_after_reopen() {
    let dir = TempDir::new().unwrap();

    let first_id = {
        let service = open_service(&dir);
        let first = service
            .create(FormKind::PurchaseOrder, json!({"poNumber": "PO-1"}), None)
            .unwrap();
        service
            .create(FormKind::PurchaseOrder, json!({"poNumber": "PO-2"}), None)
            .unwrap();
        first["_id"].as_str().unwrap().to_string()
    };

    let service = open_service(&dir);

    let third = service
        .create(FormKind::PurchaseOrder, json!({"poNumber": "PO-3"}), None)
        .unwrap();
    assert_eq!(third["revisionNo"], "3.0");

    let edited = service
        .update(FormKind::PurchaseOrder, &first_id, json!({"status": "approved"}), None)
        .unwrap();
    assert_eq!(edited["revisionNo"], "1.1");
    assert_eq!(edited["poNumber"], "PO-1");

    drop(service);
    let service = open_service(&dir);
    let stored = service.get(FormKind::PurchaseOrder, &first_id).unwrap();
    assert_eq!(stored["revisionNo"], "1.1");
    assert_eq!(stored["status"], "approved");
}

#[test]
fn test_form_types_count_independently() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);

    service.create(FormKind::ToolboxTalk, json!({}), None).unwrap();
    service.create(FormKind::ToolboxTalk, json!({}), None).unwrap();
    let drill = service.create(FormKind::QhseDrillRecord, json!({}), None).unwrap();

    assert_eq!(drill["revisionNo"], "1.0");
    assert_eq!(
        service.next_create_label(FormKind::ToolboxTalk).unwrap().to_string(),
        "3.0"
    );
}

#[test]
fn test_nested_revision_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let id = {
        let service = open_service(&dir);
        let record = service
            .create(
                FormKind::StsHoseLog,
                json!({"documentInfo": {"vessel": "MT Aurora", "revisionNo": "9.9"}}),
                None,
            )
            .unwrap();
        assert_eq!(record["documentInfo"]["revisionNo"], "1.0");
        record["_id"].as_str().unwrap().to_string()
    };

    let service = open_service(&dir);
    let edited = service
        .update(FormKind::StsHoseLog, &id, json!({"hoseCount": 4}), None)
        .unwrap();

    assert_eq!(edited["documentInfo"]["revisionNo"], "1.1");
    assert_eq!(edited["documentInfo"]["vessel"], "MT Aurora");
    assert!(edited.get("revisionNo").is_none());
}

#[test]
fn test_deleted_record_stays_deleted() {
    let dir = TempDir::new().unwrap();

    let id = {
        let service = open_service(&dir);
        let record = service.create(FormKind::RiskAssessment, json!({}), None).unwrap();
        let id = record["_id"].as_str().unwrap().to_string();
        service.delete(FormKind::RiskAssessment, &id).unwrap();
        id
    };

    let service = open_service(&dir);
    assert!(service.get(FormKind::RiskAssessment, &id).is_err());
    assert!(service.list(FormKind::RiskAssessment).unwrap().is_empty());
    assert_eq!(
        service.next_create_label(FormKind::RiskAssessment).unwrap().to_string(),
        "1.0"
    );
}

#[test]
fn test_upload_path_recorded_and_file_written() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);

    let record = service
        .create(
            FormKind::ExpenseSheet,
            json!({"amount": "120.50"}),
            Some(Upload {
                file_name: "fuel receipt.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                data: b"%PDF-1.4".to_vec(),
            }),
        )
        .unwrap();

    let public_path = record["receipt"].as_str().unwrap();
    assert!(public_path.starts_with("/uploads/expense-sheet/"));
    assert!(public_path.ends_with("fuel_receipt.pdf"));

    let relative = public_path.trim_start_matches("/uploads/");
    let on_disk = dir.path().join("uploads").join(relative);
    assert_eq!(fs::read(on_disk).unwrap(), b"%PDF-1.4");
}

#[test]
fn test_partial_append_does_not_poison_reopen() {
    use std::fs::OpenOptions;
    use std::io::Write;

    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);
    service
        .create(FormKind::PermitToWork, json!({"task": "hot work"}), None)
        .unwrap();

    // Leftover bytes of an append that failed partway
    {
        let mut file = OpenOptions::new().append(true).open(store_path(&dir)).unwrap();
        file.write_all(&[0x40, 0, 0, 0, 0x0B]).unwrap();
    }

    let second = service
        .create(FormKind::PermitToWork, json!({"task": "enclosed space"}), None)
        .unwrap();
    assert_eq!(second["revisionNo"], "2.0");
    drop(service);

    let service = open_service(&dir);
    let records = service.list(FormKind::PermitToWork).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["task"], "enclosed space");
}

// =============================================================================
// Corruption
// =============================================================================

#[test]
fn test_corrupted_store_refuses_to_open() {
    let dir = TempDir::new().unwrap();

    {
        let service = open_service(&dir);
        service
            .create(FormKind::VendorEvaluation, json!({"vendor": "Seaside Marine"}), None)
            .unwrap();
    }

    let path = store_path(&dir);
    let mut contents = fs::read(&path).unwrap();
    let mid = contents.len() / 2;
    contents[mid] ^= 0xFF;
    fs::write(&path, contents).unwrap();

    let err = FileStore::open(dir.path()).err().unwrap();
    assert_eq!(err.code(), StorageErrorCode::DataCorruption);
    assert!(err.is_fatal());
}

#[test]
fn test_truncated_store_refuses_to_open() {
    let dir = TempDir::new().unwrap();

    {
        let service = open_service(&dir);
        service.create(FormKind::CrewTimesheet, json!({"hours": 12}), None).unwrap();
    }

    let path = store_path(&dir);
    let contents = fs::read(&path).unwrap();
    fs::write(&path, &contents[..contents.len() - 3]).unwrap();

    assert!(FileStore::open(dir.path()).is_err());
}
