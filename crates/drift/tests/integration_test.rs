//! Integration tests for drift

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use drift::config::{GlobalSettings, OnTableError, SourceFormat};
use drift::source::SourceReader;
use drift::{
    Config, ErrorKind, FileClient, FileSourceSpec, RegistrationError, ResolveError, dynamic_tables,
};
use drift_core::StorageConfig;

fn write(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path.display().to_string()
}

fn json_spec(table: &str, path: String, only: &[&str]) -> FileSourceSpec {
    let mut spec = FileSourceSpec::new(table, path);
    spec.only = only.iter().map(|s| s.to_string()).collect();
    spec
}

fn client(files: Vec<FileSourceSpec>, on_table_error: OnTableError) -> FileClient {
    let settings = GlobalSettings {
        concurrency: Some(2),
        on_table_error: Some(on_table_error),
    };
    FileClient::new(
        "test",
        files,
        settings,
        SourceReader::new(StorageConfig::default()),
    )
}

mod config_tests {
    use super::*;
    use drift::config::ConfigPath;

    #[test]
    fn test_config_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("a.yaml"),
            "files:\n  - table: events\n    path: s3://bucket/events.json\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.yaml"),
            "files:\n  - table: users\n    path: ./users.csv\n    format: csv\nglobal:\n  on_table_error: abort\n",
        )
        .unwrap();

        let config = Config::from_paths(&[ConfigPath::Dir(dir.path().to_path_buf())]).unwrap();

        assert_eq!(config.file_count(), 2);
        assert_eq!(config.files[0].table, "events");
        assert_eq!(config.files[1].format, SourceFormat::Csv);
        assert_eq!(config.global.on_table_error(), OnTableError::Abort);
    }

    #[test]
    fn test_invalid_entry_fails_loading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "files:\n  - table: t\n    path: \"\"\n").unwrap();

        let err = Config::from_paths(&[ConfigPath::File(path)]).unwrap_err();
        assert_eq!(ErrorKind::from(&err), ErrorKind::Configuration);
        assert!(err.to_string().contains("empty path"));
    }
}

mod registration_tests {
    use super::*;

    #[tokio::test]
    async fn test_two_document_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "t.json",
            "{\"id\": 1, \"name\": \"a\"}\n{\"id\": 2, \"name\": \"b\"}\n",
        );

        let client = client(vec![json_spec("t", path, &["id", "name"])], OnTableError::Isolate);
        let tables = dynamic_tables(&client, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.name, "t");
        assert_eq!(table.column_names(), vec!["id:int", "name:str"]);

        let (tx, mut rx) = mpsc::channel(1);
        table.resolver().resolve(&tx).await.unwrap();
        let delivered = rx.recv().await.unwrap();
        assert_eq!(
            delivered.value(),
            &json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}])
        );
    }

    #[tokio::test]
    async fn test_tables_keep_configuration_order() {
        let dir = TempDir::new().unwrap();
        let files = (0..5)
            .map(|i| {
                let field = format!("n{i}");
                let path = write(&dir, &format!("{i}.json"), &format!("{{\"{field}\": {i}}}"));
                json_spec(&format!("t{i}"), path, &[field.as_str()])
            })
            .collect();

        let tables = dynamic_tables(&client(files, OnTableError::Isolate), &CancellationToken::new())
            .await
            .unwrap();

        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["t0", "t1", "t2", "t3", "t4"]);
        assert_eq!(tables[3].column_names(), vec!["n3:int"]);
    }

    #[tokio::test]
    async fn test_isolate_registers_failed_table() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.json", "{\"id\": 1}");
        let missing = dir.path().join("missing.json").display().to_string();

        let files = vec![
            json_spec("bad", missing, &["id"]),
            json_spec("good", good, &["id"]),
        ];
        let tables = dynamic_tables(&client(files, OnTableError::Isolate), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(tables.len(), 2);

        let bad = &tables[0];
        assert!(bad.columns.is_empty());
        assert_eq!(bad.error().map(|e| e.kind()), Some(ErrorKind::SourceUnavailable));

        let (tx, _rx) = mpsc::channel(1);
        let err = bad.resolver().resolve(&tx).await.unwrap_err();
        assert!(matches!(err, ResolveError::Assembly { .. }));
        assert_eq!(err.kind(), Some(ErrorKind::SourceUnavailable));

        assert_eq!(tables[1].column_names(), vec!["id:int"]);
    }

    #[tokio::test]
    async fn test_abort_returns_first_failure() {
        let dir = TempDir::new().unwrap();
        let good = write(&dir, "good.json", "{\"id\": 1}");
        let malformed = write(&dir, "bad.json", "{\"id\": }");
        let missing = dir.path().join("missing.json").display().to_string();

        let files = vec![
            json_spec("good", good, &["id"]),
            json_spec("malformed", malformed, &["id"]),
            json_spec("missing", missing, &["id"]),
        ];
        let err = dynamic_tables(&client(files, OnTableError::Abort), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            RegistrationError::Table { source } => {
                assert_eq!(source.table(), "malformed");
                assert_eq!(source.kind(), ErrorKind::Decode);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancelled_registration() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "t.json", "{\"id\": 1}");

        let cancel = CancellationToken::new();
        cancel.cancel();

        let client = client(vec![json_spec("t", path, &["id"])], OnTableError::Isolate);
        let err = dynamic_tables(&client, &cancel).await.unwrap_err();
        assert!(matches!(err, RegistrationError::Cancelled));
    }

    #[tokio::test]
    async fn test_csv_table() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "users.csv", "id, name ,email\n1,a,a@x\n2,b\n");

        let mut spec = json_spec("users", path, &["id", "name"]);
        spec.format = SourceFormat::Csv;
        spec.except = ["name".to_string()].into_iter().collect();

        let tables = dynamic_tables(&client(vec![spec], OnTableError::Isolate), &CancellationToken::new())
            .await
            .unwrap();
        let table = &tables[0];
        assert_eq!(table.column_names(), vec!["id:str"]);

        let (tx, mut rx) = mpsc::channel(1);
        table.resolver().resolve(&tx).await.unwrap();
        let delivered = rx.recv().await.unwrap();
        assert_eq!(
            delivered.value(),
            &json!([
                {"id": "1", "name": "a", "email": "a@x"},
                {"id": "2", "name": "b", "email": ""}
            ])
        );
    }

    #[tokio::test]
    async fn test_query_yielding_empty_list_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "t.json", "{\"items\": []}");

        let mut spec = json_spec("t", path, &["id"]);
        spec.jmespath = Some("[].items[]".to_string());

        let tables = dynamic_tables(&client(vec![spec], OnTableError::Abort), &CancellationToken::new())
            .await
            .unwrap();
        assert!(tables[0].columns.is_empty());
        assert!(tables[0].error().is_none());
    }
}

mod object_store_tests {
    use super::*;
    use drift_core::storage::BackendConfig;
    use drift_core::{StoragePool, StorageProvider};
    use object_store::memory::InMemory;
    use object_store::path::Path;
    use object_store::{ObjectStore, PutPayload};

    #[tokio::test]
    async fn test_remote_tables_share_bucket_client() {
        let store = InMemory::new();
        store
            .put(
                &Path::from("dir/sub/events.json"),
                PutPayload::from_static(b"{\"records\": [{\"id\": 1, \"ok\": true}]}"),
            )
            .await
            .unwrap();
        store
            .put(
                &Path::from("other/users.csv"),
                PutPayload::from_static(b"id,name\n1,a\n"),
            )
            .await
            .unwrap();

        let events_url = "s3://bucket-a/dir/sub/events.json";
        let bucket_key = BackendConfig::parse_url(events_url).unwrap().bucket_key();
        let pool = Arc::new(StoragePool::new());
        pool.insert(
            bucket_key,
            Arc::new(StorageProvider::with_store(Arc::new(store), "s3://bucket-a")),
        )
        .await;

        let mut events = json_spec("events", events_url.to_string(), &["id", "ok"]);
        events.jmespath = Some("[0].records".to_string());
        let mut users = json_spec("users", "s3://bucket-a/other/users.csv".to_string(), &["name"]);
        users.format = SourceFormat::Csv;
        let missing = json_spec("missing", "s3://bucket-a/nope.json".to_string(), &["id"]);

        let client = FileClient::new(
            "remote",
            vec![events, users, missing],
            GlobalSettings::default(),
            SourceReader::with_pool(pool.clone(), StorageConfig::default()),
        );
        let tables = dynamic_tables(&client, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(tables[0].column_names(), vec!["id:int", "ok:bool"]);
        assert_eq!(tables[1].column_names(), vec!["name:str"]);
        assert_eq!(
            tables[2].error().map(|e| e.kind()),
            Some(ErrorKind::SourceUnavailable)
        );
        assert_eq!(pool.provider_count().await, 1);
    }
}
