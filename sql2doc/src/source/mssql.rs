use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;
use log::info;
use tiberius::{Client, ColumnData, Config, FromSql, Query, Row};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::connector::Connector;
use crate::errors::{ConnectionError, SourceError};
use crate::materializer::RowCursor;
use crate::runtime::{block_on, new_runtime};
use crate::source::Source;
use crate::types::ColumnValue;

const LIST_TABLES_QUERY: &str = "SELECT TABLE_SCHEMA, TABLE_NAME FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_SCHEMA, TABLE_NAME";

struct TiberiusError(tiberius::error::Error);

impl From<TiberiusError> for ConnectionError {
    fn from(err: TiberiusError) -> Self {
        ConnectionError::Driver(err.0.to_string())
    }
}

impl From<tiberius::error::Error> for SourceError {
    fn from(err: tiberius::error::Error) -> Self {
        SourceError::Driver(err.to_string())
    }
}

type SqlServerClient = Client<Compat<TcpStream>>;

/// SQL Server source. Accepts ADO (`server=tcp:host,1433;user=...`) or
/// JDBC (`jdbc:sqlserver://host:1433;...`) connection strings.
pub struct SqlServer {
    connection_string: String,
    runtime: Option<Runtime>,
    client: Option<SqlServerClient>,
}

impl SqlServer {
    pub fn new<S: Into<String>>(connection_string: S) -> Self {
        SqlServer {
            connection_string: connection_string.into(),
            runtime: None,
            client: None,
        }
    }

    fn config(&self) -> Result<Config, ConnectionError> {
        let config = if self.connection_string.starts_with("jdbc:") {
            Config::from_jdbc_string(self.connection_string.as_str())
        } else {
            Config::from_ado_string(self.connection_string.as_str())
        };

        config.map_err(|err| ConnectionError::from(TiberiusError(err)))
    }
}

async fn connect(config: Config) -> Result<SqlServerClient, tiberius::error::Error> {
    let tcp = TcpStream::connect(config.get_addr())
        .await
        .map_err(|err| tiberius::error::Error::Io {
            kind: err.kind(),
            message: err.to_string(),
        })?;

    tcp.set_nodelay(true).ok();

    Client::connect(config, tcp.compat_write()).await
}

impl Connector for SqlServer {
    fn init(&mut self) -> Result<(), ConnectionError> {
        let config = self.config()?;
        let addr = config.get_addr();

        let runtime = new_runtime("mssql-source")?;
        let client = block_on(connect(config), &runtime).map_err(TiberiusError)?;

        self.runtime = Some(runtime);
        self.client = Some(client);
        self.ping()?;

        info!("connected to sql server at {}", addr);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        let result = match (self.client.take(), self.runtime.as_ref()) {
            (Some(client), Some(runtime)) => block_on(client.close(), runtime).map_err(TiberiusError),
            _ => Ok(()),
        };

        self.runtime = None;
        Ok(result?)
    }
}

impl Source for SqlServer {
    fn list_tables(&mut self) -> Result<Vec<String>, SourceError> {
        let (client, runtime) = match (self.client.as_mut(), self.runtime.as_ref()) {
            (Some(client), Some(runtime)) => (client, runtime),
            _ => return Err(SourceError::NotConnected),
        };

        let rows = block_on(
            async {
                client
                    .simple_query(LIST_TABLES_QUERY)
                    .await?
                    .into_first_result()
                    .await
            },
            runtime,
        )?;

        Ok(rows
            .iter()
            .map(|row| {
                format!(
                    "{}.{}",
                    row.get::<&str, _>(0).unwrap_or_default(),
                    row.get::<&str, _>(1).unwrap_or_default()
                )
            })
            .collect())
    }

    /// `schema.table` becomes `[schema].[table]`
    fn table_query(&self, table: &str) -> String {
        let quote = |identifier: &str| format!("[{}]", identifier.replace(']', "]]"));

        match table.split_once('.') {
            Some((schema, name)) => format!("SELECT * FROM {}.{}", quote(schema), quote(name)),
            None => format!("SELECT * FROM {}", quote(table)),
        }
    }

    fn query<'a>(
        &'a mut self,
        sql: &str,
        params: &[ColumnValue],
    ) -> Result<Box<dyn RowCursor + 'a>, SourceError> {
        let (client, runtime) = match (self.client.as_mut(), self.runtime.as_ref()) {
            (Some(client), Some(runtime)) => (client, runtime),
            _ => return Err(SourceError::NotConnected),
        };

        // parameters are referenced as @P1, @P2, ... in the statement
        let mut query = Query::new(sql.to_string());
        for param in params {
            bind(&mut query, param);
        }

        let mut stream = block_on(query.query(client), runtime)?;
        let columns = block_on(stream.columns(), runtime)?
            .map(|columns| {
                columns
                    .iter()
                    .map(|column| column.name().to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(Box::new(SqlServerCursor {
            columns,
            rows: stream.into_row_stream(),
            runtime,
        }))
    }

    fn ping(&mut self) -> Result<(), ConnectionError> {
        match (self.client.as_mut(), self.runtime.as_ref()) {
            (Some(client), Some(runtime)) => {
                let _ = block_on(
                    async { client.simple_query("SELECT 1").await?.into_row().await },
                    runtime,
                )
                .map_err(TiberiusError)?;

                Ok(())
            }
            _ => Err(ConnectionError::NotConnected),
        }
    }
}

struct SqlServerCursor<'a> {
    columns: Vec<String>,
    rows: BoxStream<'a, tiberius::Result<Row>>,
    runtime: &'a Runtime,
}

impl<'a> RowCursor for SqlServerCursor<'a> {
    fn columns(&self) -> &[String] {
        self.columns.as_slice()
    }

    fn next_row(&mut self) -> Option<Result<Vec<ColumnValue>, SourceError>> {
        match block_on(self.rows.try_next(), self.runtime) {
            Ok(Some(row)) => Some(Ok(row.into_iter().map(from_column_data).collect())),
            Ok(None) => None,
            Err(err) => Some(Err(SourceError::from(err))),
        }
    }
}

fn bind(query: &mut Query<'static>, value: &ColumnValue) {
    match value {
        ColumnValue::Null => query.bind(Option::<String>::None),
        ColumnValue::Text(v) => query.bind(v.clone()),
        ColumnValue::RawBytes(v) => query.bind(v.clone()),
        ColumnValue::Integer(v) => query.bind(*v),
        ColumnValue::UInteger(v) => match i64::try_from(*v) {
            Ok(v) => query.bind(v),
            Err(_) => query.bind(v.to_string()),
        },
        ColumnValue::Float(v) => query.bind(*v),
        ColumnValue::Boolean(v) => query.bind(*v),
        ColumnValue::Timestamp(v) => query.bind(*v),
        ColumnValue::Unrecognized(v) => query.bind(v.clone()),
    }
}

fn from_column_data(data: ColumnData<'static>) -> ColumnValue {
    let value = match &data {
        ColumnData::U8(v) => v.map(|v| ColumnValue::Integer(v as i64)),
        ColumnData::I16(v) => v.map(|v| ColumnValue::Integer(v as i64)),
        ColumnData::I32(v) => v.map(|v| ColumnValue::Integer(v as i64)),
        ColumnData::I64(v) => v.map(ColumnValue::Integer),
        ColumnData::F32(v) => v.map(|v| ColumnValue::Float(v as f64)),
        ColumnData::F64(v) => v.map(ColumnValue::Float),
        ColumnData::Bit(v) => v.map(ColumnValue::Boolean),
        ColumnData::String(v) => v.as_ref().map(|v| ColumnValue::Text(v.to_string())),
        ColumnData::Guid(v) => v.as_ref().map(|v| ColumnValue::Text(v.to_string())),
        ColumnData::Binary(v) => v.as_ref().map(|v| ColumnValue::RawBytes(v.to_vec())),
        // decimal and money columns keep their exact textual form
        ColumnData::Numeric(v) => v.as_ref().map(|v| ColumnValue::Text(v.to_string())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(&data)
                .ok()
                .flatten()
                .map(ColumnValue::Timestamp)
        }
        ColumnData::Date(_) => NaiveDate::from_sql(&data)
            .ok()
            .flatten()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(ColumnValue::Timestamp),
        ColumnData::Time(_) => NaiveTime::from_sql(&data)
            .ok()
            .flatten()
            .map(|time| ColumnValue::Text(time.to_string())),
        ColumnData::DateTimeOffset(_) => DateTime::<Utc>::from_sql(&data)
            .ok()
            .flatten()
            .map(|ts| ColumnValue::Timestamp(ts.naive_utc())),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|xml| ColumnValue::Text(xml.clone().into_owned().into_string())),
        #[allow(unreachable_patterns)]
        other => Some(ColumnValue::Unrecognized(format!("{:?}", other))),
    };

    value.unwrap_or(ColumnValue::Null)
}
