use sql2doc::destination::generic_stdout::GenericStdout;
use sql2doc::destination::memory::MemoryDestination;
use sql2doc::resolver::{CatalogEntry, QueryCatalog, WorkMode};
use sql2doc::source::memory::{MemorySource, MemoryTable};
use sql2doc::tasks::transfer::{TransferOptions, TransferTask};
use sql2doc::tasks::{Task, TransferResult, TransferState};
use sql2doc::types::{ColumnValue, NormalizedValue};

fn loja() -> MemoryTable {
    MemoryTable::new(vec!["id", "nome", "ativo"])
        .row(vec![
            ColumnValue::Integer(1),
            ColumnValue::RawBytes(b"Acme".to_vec()),
            ColumnValue::Boolean(true),
        ])
        .row(vec![
            ColumnValue::Integer(2),
            ColumnValue::RawBytes(b"Beta".to_vec()),
            ColumnValue::Boolean(false),
        ])
}

fn full_database() -> WorkMode {
    WorkMode::FullDatabase { skip: vec![] }
}

#[test]
fn test_loja_documents_have_no_bytes() {
    let source = MemorySource::new().with_table("loja", loja());

    let mut task = TransferTask::new(
        source,
        MemoryDestination::new(),
        full_database(),
        TransferOptions::new("LOJAS"),
    );
    let report = task.run(|_, _| {}).unwrap();

    assert_eq!(report.successes(), 1);
    assert_eq!(task.state(), TransferState::Done);

    let documents = task.destination().documents("LOJAS");
    assert_eq!(documents.len(), 2);

    assert_eq!(documents[0].keys().collect::<Vec<_>>(), vec!["id", "nome", "ativo"]);
    assert_eq!(documents[0].get("id"), Some(&NormalizedValue::Integer(1)));
    assert_eq!(
        documents[0].get("nome"),
        Some(&NormalizedValue::String("Acme".to_string()))
    );
    assert_eq!(documents[0].get("ativo"), Some(&NormalizedValue::Boolean(true)));
    assert_eq!(
        documents[1].get("nome"),
        Some(&NormalizedValue::String("Beta".to_string()))
    );
    assert_eq!(documents[1].get("ativo"), Some(&NormalizedValue::Boolean(false)));

    for document in documents {
        let bson = document.to_bson();
        assert!(bson
            .values()
            .all(|value| !matches!(value, bson::Bson::Binary(_))));
    }
}

#[test]
fn test_zero_tables() {
    let mut task = TransferTask::new(
        MemorySource::new(),
        MemoryDestination::new(),
        full_database(),
        TransferOptions::new("LOJAS"),
    );

    let mut calls = 0;
    let report = task.run(|_, _| calls += 1).unwrap();

    assert!(report.units.is_empty());
    assert_eq!(report.failures(), 0);
    assert_eq!(task.state(), TransferState::Done);
    assert!(task.destination().batch_sizes().is_empty());
    assert_eq!(calls, 1);
}

#[test]
fn test_failing_catalog_query() {
    let mut catalog = QueryCatalog::new();
    catalog.insert(
        "vendas".to_string(),
        CatalogEntry::Sql("SELECT * FROM vendas_inexistente".to_string()),
    );

    let source = MemorySource::new().with_failing_query("SELECT * FROM vendas_inexistente");

    let mut task = TransferTask::new(
        source,
        MemoryDestination::new(),
        WorkMode::Catalog(catalog),
        TransferOptions::new("LOJAS"),
    );
    let report = task.run(|_, _| {}).unwrap();

    assert_eq!(report.failures(), 1);
    assert!(matches!(
        report.units[0].1,
        TransferResult::SourceQueryFailed(_)
    ));
    assert_eq!(task.state(), TransferState::Done);
    assert_eq!(task.destination().total_documents(), 0);
}

#[test]
fn test_catalog_collection_override() {
    let catalog: QueryCatalog = serde_yaml::from_str(
        r#"
lojas: SELECT * FROM loja
ativas:
  query: SELECT * FROM loja WHERE ativo = ?
  params: [true]
  collection: LOJAS_ATIVAS
"#,
    )
    .unwrap();

    let source = MemorySource::new()
        .with_query("SELECT * FROM loja", loja())
        .with_query(
            "SELECT * FROM loja WHERE ativo = ?",
            MemoryTable::new(vec!["id"]).row(vec![ColumnValue::Integer(1)]),
        );

    let mut task = TransferTask::new(
        source,
        MemoryDestination::new(),
        WorkMode::Catalog(catalog),
        TransferOptions::new("LOJAS"),
    );
    let report = task.run(|_, _| {}).unwrap();

    assert_eq!(report.successes(), 2);
    assert_eq!(task.destination().documents("LOJAS").len(), 2);
    assert_eq!(task.destination().documents("LOJAS_ATIVAS").len(), 1);
    assert_eq!(
        task.source().executed()[0].1,
        vec![ColumnValue::Boolean(true)]
    );
}

#[test]
fn test_json_lines_output() {
    let source = MemorySource::new().with_table("loja", loja());

    let mut output = vec![];
    {
        let mut options = TransferOptions::new("LOJAS");
        options.batch_size = 1;

        let mut task = TransferTask::new(
            source,
            GenericStdout::with_writer(&mut output),
            full_database(),
            options,
        );
        let report = task.run(|_, _| {}).unwrap();
        assert_eq!(report.documents_written(), 2);
    }

    let output = String::from_utf8(output).unwrap();
    assert_eq!(
        output.lines().collect::<Vec<_>>(),
        vec![
            r#"{"collection":"LOJAS","document":{"id":1,"nome":"Acme","ativo":true}}"#,
            r#"{"collection":"LOJAS","document":{"id":2,"nome":"Beta","ativo":false}}"#,
        ]
    );
}
