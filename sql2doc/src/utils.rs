use prettytable::{format, Table};
use url::Url;

pub fn table() -> Table {
    // Create the table
    let mut table = Table::new();

    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);

    table
}

/// hide the password of a connection uri before logging it
pub fn redact_uri(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => String::from("<connection string>"),
    }
}

pub fn get_sql2doc_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
