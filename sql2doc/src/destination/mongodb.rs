use bson::doc;
use log::info;
use mongodb::error::ErrorKind;
use mongodb::{Client, Database};
use tokio::runtime::Runtime;

use crate::connector::Connector;
use crate::destination::Destination;
use crate::errors::{ConnectionError, SinkError};
use crate::runtime::{block_on, new_runtime};
use crate::sink::DocumentSink;
use crate::types::{Document, WriteCount};
use crate::utils::redact_uri;

struct MongoError(mongodb::error::Error);

impl From<MongoError> for ConnectionError {
    fn from(err: MongoError) -> Self {
        ConnectionError::Driver(err.0.to_string())
    }
}

pub struct MongoDB {
    connection_uri: String,
    database_name: Option<String>,
    runtime: Option<Runtime>,
    client: Option<Client>,
    database: Option<Database>,
}

impl MongoDB {
    /// `database` falls back to the default database of the connection uri
    pub fn new<S: Into<String>>(connection_uri: S, database: Option<String>) -> Self {
        MongoDB {
            connection_uri: connection_uri.into(),
            database_name: database,
            runtime: None,
            client: None,
            database: None,
        }
    }

    fn ping(&self) -> Result<(), ConnectionError> {
        match (self.database.as_ref(), self.runtime.as_ref()) {
            (Some(database), Some(runtime)) => {
                let _ = block_on(database.run_command(doc! {"ping": 1}, None), runtime)
                    .map_err(MongoError)?;
                Ok(())
            }
            _ => Err(ConnectionError::NotConnected),
        }
    }
}

impl Connector for MongoDB {
    fn init(&mut self) -> Result<(), ConnectionError> {
        let runtime = new_runtime("mongodb-destination")?;
        let client = block_on(Client::with_uri_str(self.connection_uri.as_str()), &runtime)
            .map_err(MongoError)?;

        let database = match self.database_name.as_deref() {
            Some(name) => client.database(name),
            None => client.default_database().ok_or_else(|| {
                ConnectionError::Driver(
                    "no database configured and none in the connection uri".to_string(),
                )
            })?,
        };

        self.runtime = Some(runtime);
        self.client = Some(client);
        self.database = Some(database);
        self.ping()?;

        info!("connected to {}", redact_uri(self.connection_uri.as_str()));
        Ok(())
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        self.database = None;
        if let (Some(client), Some(runtime)) = (self.client.take(), self.runtime.as_ref()) {
            block_on(client.shutdown(), runtime);
        }

        self.runtime = None;
        Ok(())
    }
}

impl DocumentSink for MongoDB {
    fn insert_many(
        &mut self,
        collection: &str,
        documents: &[Document],
    ) -> Result<WriteCount, SinkError> {
        let (database, runtime) = match (self.database.as_ref(), self.runtime.as_ref()) {
            (Some(database), Some(runtime)) => (database, runtime),
            _ => return Err(SinkError::new(0, "destination is not connected")),
        };

        let collection = database.collection::<bson::Document>(collection);
        let documents = documents.iter().map(Document::to_bson).collect::<Vec<_>>();

        // ordered insert: everything before the first failed index is committed
        match block_on(collection.insert_many(documents, None), runtime) {
            Ok(result) => Ok(result.inserted_ids.len()),
            Err(err) => Err(SinkError::new(written_before_failure(&err), err.to_string())),
        }
    }
}

impl Destination for MongoDB {}

fn written_before_failure(err: &mongodb::error::Error) -> WriteCount {
    match err.kind.as_ref() {
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .and_then(|errors| errors.iter().map(|error| error.index).min())
            .unwrap_or(0),
        _ => 0,
    }
}
