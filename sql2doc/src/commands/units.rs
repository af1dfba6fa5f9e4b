use log::warn;

use sql2doc::config::{Config, SourceUri};
use sql2doc::connector::Connector;
use sql2doc::resolver::{resolve, WorkMode};
use sql2doc::source::firebird::Firebird;
use sql2doc::source::mssql::SqlServer;
use sql2doc::source::mysql::Mysql;
use sql2doc::source::Source;
use sql2doc::types::WorkUnit;
use sql2doc::utils::table;

/// Display the work units a run would transfer, in execution order
pub fn list(config: &Config) -> anyhow::Result<()> {
    let mode = config.source.work_mode();

    let units = match config.source.connection_uri()? {
        SourceUri::Mysql(uri) => resolve_units(Mysql::new(uri), &mode)?,
        SourceUri::SqlServer(connection_string) => {
            resolve_units(SqlServer::new(connection_string), &mode)?
        }
        SourceUri::Firebird(uri) => resolve_units(Firebird::new(uri), &mode)?,
    };

    if units.is_empty() {
        println!("<empty> no work units\n");
        return Ok(());
    }

    let mut table = table();
    table.set_titles(row!["name", "kind", "collection", "parameters", "sql"]);

    for unit in &units {
        table.add_row(row![
            unit.name(),
            unit.kind(),
            unit.collection()
                .unwrap_or(config.destination.collection.as_str()),
            unit.params().len(),
            unit.sql(),
        ]);
    }

    let _ = table.printstd();

    Ok(())
}

fn resolve_units<S: Source>(mut source: S, mode: &WorkMode) -> anyhow::Result<Vec<WorkUnit>> {
    // a query catalog is resolved without touching the database
    if let WorkMode::Catalog(_) = mode {
        return Ok(resolve(mode, &mut source)?);
    }

    source.init()?;
    let units = resolve(mode, &mut source);

    if let Err(err) = source.close() {
        warn!("cannot close the source connection: {}", err);
    }

    Ok(units?)
}
