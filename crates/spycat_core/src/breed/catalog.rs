//! Breed catalog capability and its HTTP/static implementations.

use crate::config::BreedCatalogConfig;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed-shape answer of one catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreedLookup {
    pub found: bool,
    /// Catalog spelling of the breed when `found`.
    pub canonical_name: Option<String>,
}

impl BreedLookup {
    pub fn found(canonical_name: impl Into<String>) -> Self {
        Self {
            found: true,
            canonical_name: Some(canonical_name.into()),
        }
    }

    pub fn missing() -> Self {
        Self {
            found: false,
            canonical_name: None,
        }
    }
}

/// Catalog failure. Always retryable by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreedLookupError {
    /// Transport failure: DNS, connect, timeout, TLS.
    Unreachable(String),
    /// Catalog answered with a non-success HTTP status.
    UnexpectedStatus(u16),
    /// Catalog payload does not have the expected shape.
    Malformed(String),
    /// Client could not be constructed from configuration.
    Client(String),
}

impl Display for BreedLookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable(message) => write!(f, "breed catalog unreachable: {message}"),
            Self::UnexpectedStatus(status) => {
                write!(f, "breed catalog answered with status {status}")
            }
            Self::Malformed(message) => write!(f, "malformed breed catalog payload: {message}"),
            Self::Client(message) => write!(f, "breed catalog client error: {message}"),
        }
    }
}

impl Error for BreedLookupError {}

/// External breed lookup capability.
pub trait BreedCatalog {
    /// Looks up `name` with case-insensitive exact matching.
    fn lookup_breed(&self, name: &str) -> Result<BreedLookup, BreedLookupError>;
}

impl<T: BreedCatalog + ?Sized> BreedCatalog for &T {
    fn lookup_breed(&self, name: &str) -> Result<BreedLookup, BreedLookupError> {
        (**self).lookup_breed(name)
    }
}

impl<T: BreedCatalog + ?Sized> BreedCatalog for Box<T> {
    fn lookup_breed(&self, name: &str) -> Result<BreedLookup, BreedLookupError> {
        (**self).lookup_breed(name)
    }
}

/// Breed catalog served over HTTP as a JSON array of `{ "name": ... }`
/// objects (TheCatAPI `/v1/breeds` shape).
pub struct HttpBreedCatalog {
    url: String,
    http_client: reqwest::blocking::Client,
}

impl HttpBreedCatalog {
    /// Builds a blocking client with the configured timeouts.
    ///
    /// # Errors
    /// - `Client` when the URL is blank or the HTTP client cannot be built.
    pub fn new(config: &BreedCatalogConfig) -> Result<Self, BreedLookupError> {
        let url = config.url.trim();
        if url.is_empty() {
            return Err(BreedLookupError::Client(
                "breed catalog url must not be empty".to_string(),
            ));
        }

        let http_client = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|error| BreedLookupError::Client(error.to_string()))?;

        Ok(Self {
            url: url.to_string(),
            http_client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl BreedCatalog for HttpBreedCatalog {
    fn lookup_breed(&self, name: &str) -> Result<BreedLookup, BreedLookupError> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .map_err(|error| BreedLookupError::Unreachable(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BreedLookupError::UnexpectedStatus(status.as_u16()));
        }

        let payload: Value = response
            .json()
            .map_err(|error| BreedLookupError::Malformed(error.to_string()))?;
        let names = parse_breed_names(&payload)?;
        Ok(match_breed(name, &names))
    }
}

/// In-process catalog over a fixed list of breed names.
#[derive(Debug, Clone, Default)]
pub struct StaticBreedCatalog {
    names: Vec<String>,
}

impl StaticBreedCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl BreedCatalog for StaticBreedCatalog {
    fn lookup_breed(&self, name: &str) -> Result<BreedLookup, BreedLookupError> {
        Ok(match_breed(name, &self.names))
    }
}

/// Extracts breed names from a catalog payload.
///
/// # Errors
/// - `Malformed` when the payload is not an array, or an entry lacks a
///   string `name`.
pub fn parse_breed_names(payload: &Value) -> Result<Vec<String>, BreedLookupError> {
    let entries = payload.as_array().ok_or_else(|| {
        BreedLookupError::Malformed("expected a JSON array of breeds".to_string())
    })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    BreedLookupError::Malformed(format!("breed entry {index} has no string `name`"))
                })
        })
        .collect()
}

fn match_breed(name: &str, names: &[String]) -> BreedLookup {
    let wanted = name.trim();
    names
        .iter()
        .find(|candidate| candidate.trim().eq_ignore_ascii_case(wanted))
        .map(|candidate| BreedLookup::found(candidate.trim()))
        .unwrap_or_else(BreedLookup::missing)
}

#[cfg(test)]
mod tests {
    use super::{
        match_breed, parse_breed_names, BreedCatalog, BreedLookup, BreedLookupError,
        HttpBreedCatalog, StaticBreedCatalog,
    };
    use crate::config::BreedCatalogConfig;
    use serde_json::json;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;
    use std::time::Duration;

    /// Serves exactly one HTTP response and returns the catalog URL.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v1/breeds", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();
        });
        (url, handle)
    }

    fn http_catalog(url: &str) -> HttpBreedCatalog {
        HttpBreedCatalog::new(&BreedCatalogConfig {
            url: url.to_string(),
            connect_timeout: Duration::from_secs(2),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn parse_breed_names_reads_catalog_shape() {
        let payload = json!([
            { "id": "abys", "name": "Abyssinian", "origin": "Egypt" },
            { "id": "siam", "name": "Siamese" }
        ]);
        assert_eq!(
            parse_breed_names(&payload).unwrap(),
            vec!["Abyssinian".to_string(), "Siamese".to_string()]
        );
    }

    #[test]
    fn parse_breed_names_rejects_unexpected_shapes() {
        let err = parse_breed_names(&json!({ "breeds": [] })).unwrap_err();
        assert!(matches!(err, BreedLookupError::Malformed(_)));

        let err = parse_breed_names(&json!([{ "name": "Bengal" }, { "name": 7 }])).unwrap_err();
        assert!(matches!(err, BreedLookupError::Malformed(message) if message.contains("entry 1")));
    }

    #[test]
    fn match_is_case_insensitive_and_exact() {
        let names = vec!["Siamese".to_string(), "Scottish Fold".to_string()];
        assert_eq!(
            match_breed("  scottish fold ", &names),
            BreedLookup::found("Scottish Fold")
        );
        assert_eq!(match_breed("Scottish", &names), BreedLookup::missing());
    }

    #[test]
    fn static_catalog_answers_without_io() {
        let catalog = StaticBreedCatalog::new(["Bengal"]);
        assert!(catalog.lookup_breed("BENGAL").unwrap().found);
        assert!(!catalog.lookup_breed("Sphinx").unwrap().found);
    }

    #[test]
    fn http_catalog_requires_url() {
        let config = BreedCatalogConfig {
            url: "  ".to_string(),
            connect_timeout: Duration::from_secs(1),
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(
            HttpBreedCatalog::new(&config),
            Err(BreedLookupError::Client(_))
        ));
    }

    #[test]
    fn http_catalog_reports_unreachable_host_as_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = BreedCatalogConfig {
            url: format!("http://127.0.0.1:{port}/v1/breeds"),
            connect_timeout: Duration::from_millis(500),
            timeout: Duration::from_secs(1),
        };
        let catalog = HttpBreedCatalog::new(&config).unwrap();
        let err = catalog.lookup_breed("Siamese").unwrap_err();
        assert!(matches!(err, BreedLookupError::Unreachable(_)));
    }

    #[test]
    fn http_catalog_matches_names_from_successful_response() {
        let (url, server) = serve_once(
            "200 OK",
            r#"[{"id":"abys","name":"Abyssinian"},{"id":"siam","name":"Siamese"}]"#,
        );
        let catalog = http_catalog(&format!("  {url} "));
        assert_eq!(catalog.url(), url);

        let lookup = catalog.lookup_breed("siamese").unwrap();
        assert_eq!(lookup, BreedLookup::found("Siamese"));
        server.join().unwrap();
    }

    #[test]
    fn http_catalog_reports_error_status_instead_of_missing_breed() {
        let (url, server) = serve_once("503 Service Unavailable", r#"{"message":"down"}"#);
        let catalog: Box<dyn BreedCatalog> = Box::new(http_catalog(&url));

        let err = catalog.lookup_breed("Siamese").unwrap_err();
        assert_eq!(err, BreedLookupError::UnexpectedStatus(503));
        server.join().unwrap();
    }

    #[test]
    fn http_catalog_reports_undecodable_body_as_malformed() {
        let (url, server) = serve_once("200 OK", "<html>maintenance</html>");
        let catalog = http_catalog(&url);

        let err = catalog.lookup_breed("Siamese").unwrap_err();
        assert!(matches!(err, BreedLookupError::Malformed(_)));
        server.join().unwrap();
    }
}
