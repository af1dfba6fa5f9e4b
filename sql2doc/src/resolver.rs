use std::collections::BTreeMap;

use log::{debug, info};
use serde::Deserialize;

use crate::errors::TransferError;
use crate::source::Source;
use crate::types::{ParamValue, WorkUnit};

/// Catalog entry: plain SQL text, or a statement with parameters and a target collection
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    Sql(String),
    Detailed {
        query: String,
        #[serde(default)]
        params: Vec<ParamValue>,
        collection: Option<String>,
    },
}

/// Named queries; iteration is ordered by name
pub type QueryCatalog = BTreeMap<String, CatalogEntry>;

#[derive(Debug, Clone, PartialEq)]
pub enum WorkMode {
    /// every table listed by the source, minus `skip`
    FullDatabase { skip: Vec<String> },
    Catalog(QueryCatalog),
}

impl WorkMode {
    pub fn describe(&self) -> &'static str {
        match self {
            WorkMode::FullDatabase { .. } => "full database",
            WorkMode::Catalog(_) => "query catalog",
        }
    }
}

/// Resolve the work units of a run, sorted by name.
///
/// Failing to list the tables is fatal for the run.
pub fn resolve<S: Source + ?Sized>(
    mode: &WorkMode,
    source: &mut S,
) -> Result<Vec<WorkUnit>, TransferError> {
    let units = match mode {
        WorkMode::FullDatabase { skip } => {
            let mut tables = source
                .list_tables()
                .map_err(TransferError::CatalogUnavailable)?;
            tables.sort();
            tables.dedup();

            tables
                .into_iter()
                .filter(|table| {
                    let skipped = skip.iter().any(|name| name == table);
                    if skipped {
                        debug!("skipping table '{}'", table);
                    }
                    !skipped
                })
                .map(|table| WorkUnit::Table {
                    sql: source.table_query(table.as_str()),
                    name: table,
                })
                .collect::<Vec<_>>()
        }
        WorkMode::Catalog(catalog) => catalog
            .iter()
            .map(|(name, entry)| match entry {
                CatalogEntry::Sql(sql) => WorkUnit::Query {
                    name: name.clone(),
                    sql: sql.clone(),
                    params: vec![],
                    collection: None,
                },
                CatalogEntry::Detailed {
                    query,
                    params,
                    collection,
                } => WorkUnit::Query {
                    name: name.clone(),
                    sql: query.clone(),
                    params: params.clone(),
                    collection: collection.clone(),
                },
            })
            .collect::<Vec<_>>(),
    };

    info!("{} work unit(s) resolved from {}", units.len(), mode.describe());
    Ok(units)
}

#[cfg(test)]
mod tests {
    use crate::connector::Connector;
    use crate::errors::TransferError;
    use crate::resolver::{resolve, CatalogEntry, QueryCatalog, WorkMode};
    use crate::source::memory::{MemorySource, MemoryTable};
    use crate::types::{ParamValue, WorkUnit};

    fn source() -> MemorySource {
        let mut source = MemorySource::new()
            .with_table("vendas", MemoryTable::new(vec!["id"]))
            .with_table("loja", MemoryTable::new(vec!["id"]))
            .with_table("audit", MemoryTable::new(vec!["id"]));
        source.init().unwrap();
        source
    }

    #[test]
    fn full_database_is_sorted() {
        let mut source = source();
        let units = resolve(&WorkMode::FullDatabase { skip: vec![] }, &mut source).unwrap();

        let names = units.iter().map(WorkUnit::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["audit", "loja", "vendas"]);
        assert_eq!(units[1].sql(), "SELECT * FROM loja");
        assert!(units[1].params().is_empty());
    }

    #[test]
    fn full_database_skips_tables() {
        let mut source = source();
        let mode = WorkMode::FullDatabase {
            skip: vec!["audit".to_string()],
        };

        let units = resolve(&mode, &mut source).unwrap();
        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|unit| unit.name() != "audit"));
    }

    #[test]
    fn empty_database() {
        let mut source = MemorySource::new();
        source.init().unwrap();

        let units = resolve(&WorkMode::FullDatabase { skip: vec![] }, &mut source).unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn listing_failure_is_fatal() {
        let mut source = MemorySource::new().with_failing_listing();
        source.init().unwrap();

        let err = resolve(&WorkMode::FullDatabase { skip: vec![] }, &mut source).unwrap_err();
        assert!(matches!(err, TransferError::CatalogUnavailable(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn catalog_units() {
        let catalog: QueryCatalog = serde_yaml::from_str(
            r#"
vendas:
  query: SELECT * FROM venda WHERE data <= ?
  params: [now]
  collection: VENDAS
lojas: SELECT * FROM loja
"#,
        )
        .unwrap();

        assert_eq!(
            catalog.get("lojas"),
            Some(&CatalogEntry::Sql("SELECT * FROM loja".to_string()))
        );

        let mut source = MemorySource::new();
        let units = resolve(&WorkMode::Catalog(catalog), &mut source).unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].name(), "lojas");
        assert_eq!(units[0].collection(), None);
        assert_eq!(units[1].name(), "vendas");
        assert_eq!(units[1].params(), &[ParamValue::Now]);
        assert_eq!(units[1].collection(), Some("VENDAS"));
    }
}
