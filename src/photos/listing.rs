//! Remote photo listing
//!
//! The listing service answers `GET {base}/api/photos?folder=..&t=..` (both
//! values percent-encoded) with
//! `{"photos": [{"id", "key", "url"}]}`. A failed or malformed listing is
//! treated as an empty one so the tree falls back to its default cards.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use super::PhotoError;

/// Upper bound for a single downloaded photo
const MAX_PHOTO_BYTES: u64 = 32 * 1024 * 1024;

/// One photo offered by the listing service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhotoRecord {
    pub id: String,
    pub key: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default)]
    photos: Vec<PhotoRecord>,
}

/// A source of remote photos
pub trait PhotoListing: Send + Sync {
    /// Lists the photos currently available
    fn list(&self) -> Result<Vec<PhotoRecord>, PhotoError>;

    /// Downloads the full image file of one record
    fn fetch(&self, record: &PhotoRecord) -> Result<Vec<u8>, PhotoError>;
}

/// Lists `listing`, logging and swallowing any failure
pub fn list_or_empty(listing: &dyn PhotoListing) -> Vec<PhotoRecord> {
    match listing.list() {
        Ok(records) => records,
        Err(e) => {
            log::warn!("Failed to fetch photo listing: {e}");
            Vec::new()
        }
    }
}

/// Parses a listing response body
pub fn parse_listing(body: &str) -> Result<Vec<PhotoRecord>, PhotoError> {
    let response: ListingResponse =
        serde_json::from_str(body).map_err(|e| PhotoError::Listing(e.to_string()))?;
    Ok(response.photos)
}

/// Listing used when no photo service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyListing;

impl PhotoListing for EmptyListing {
    fn list(&self) -> Result<Vec<PhotoRecord>, PhotoError> {
        Ok(Vec::new())
    }

    fn fetch(&self, record: &PhotoRecord) -> Result<Vec<u8>, PhotoError> {
        Err(PhotoError::Listing(format!("no photo service for {}", record.url)))
    }
}

/// Listing backed by the photo service's HTTP API
pub struct HttpPhotoListing {
    agent: ureq::Agent,
    base_url: String,
    folder: String,
}

impl HttpPhotoListing {
    pub fn new(base_url: impl Into<String>, folder: impl Into<String>) -> Self {
        Self::with_agent(base_url, folder, ureq::Agent::new_with_defaults())
    }

    pub fn with_agent(base_url: impl Into<String>, folder: impl Into<String>, agent: ureq::Agent) -> Self {
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            folder: folder.into(),
        }
    }

    /// Listing endpoint without its query string
    pub fn endpoint(&self) -> String {
        format!("{}/api/photos", self.base_url)
    }
}

impl PhotoListing for HttpPhotoListing {
    fn list(&self) -> Result<Vec<PhotoRecord>, PhotoError> {
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let endpoint = self.endpoint();
        log::debug!("Fetching photo listing for {:?} from {endpoint}", self.folder);

        // Query values are percent-encoded; the timestamp defeats intermediate caches
        let body = self
            .agent
            .get(&endpoint)
            .query("folder", &self.folder)
            .query("t", unix_ms.to_string())
            .header("Accept", "application/json")
            .call()?
            .into_body()
            .read_to_string()?;

        let records = parse_listing(&body)?;
        log::info!("Photo service listed {} photos", records.len());
        Ok(records)
    }

    fn fetch(&self, record: &PhotoRecord) -> Result<Vec<u8>, PhotoError> {
        let bytes = self
            .agent
            .get(&record.url)
            .call()?
            .into_body()
            .with_config()
            .limit(MAX_PHOTO_BYTES)
            .read_to_vec()?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing() {
        let body = r#"{"photos":[{"id":"1","key":"christmas-tree/a.jpg","url":"https://cdn.example.com/a.jpg"}]}"#;
        let records = parse_listing(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "christmas-tree/a.jpg");
        assert_eq!(records[0].url, "https://cdn.example.com/a.jpg");
    }

    #[test]
    fn test_missing_photos_field_is_empty() {
        assert!(parse_listing("{}").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_listing() {
        assert!(matches!(parse_listing("<html>"), Err(PhotoError::Listing(_))));
        assert!(matches!(
            parse_listing(r#"{"photos":[{"id":"1"}]}"#),
            Err(PhotoError::Listing(_))
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let listing = HttpPhotoListing::new("https://photos.example.com/", "christmas-tree");
        assert_eq!(listing.endpoint(), "https://photos.example.com/api/photos");
    }

    /// Serves one canned listing on loopback and returns the request line it saw
    fn serve_listing_once(body: &'static str) -> (String, std::thread::JoinHandle<String>) {
        use std::io::{BufRead, BufReader, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut header = String::new();
            while reader.read_line(&mut header).unwrap() > 0 && header != "\r\n" {
                header.clear();
            }

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
            request_line
        });
        (base, server)
    }

    #[test]
    fn test_folder_is_percent_encoded() {
        let (base, server) = serve_listing_once(r#"{"photos":[{"id":"1","key":"k","url":"https://cdn.example.com/a.jpg"}]}"#);
        let agent = ureq::Agent::new_with_config(ureq::Agent::config_builder().proxy(None).build());
        let listing = HttpPhotoListing::with_agent(base, "my photos&more#1", agent);

        let records = listing.list().unwrap();
        assert_eq!(records.len(), 1);

        let request_line = server.join().unwrap();
        assert!(
            request_line.starts_with("GET /api/photos?folder=my%20photos%26more%231&t="),
            "{request_line}"
        );
        assert_eq!(request_line.trim_end().split(' ').count(), 3, "{request_line}");
    }

    struct FailingListing;

    impl PhotoListing for FailingListing {
        fn list(&self) -> Result<Vec<PhotoRecord>, PhotoError> {
            Err(PhotoError::Listing("HTTP 500".into()))
        }

        fn fetch(&self, _record: &PhotoRecord) -> Result<Vec<u8>, PhotoError> {
            unreachable!()
        }
    }

    #[test]
    fn test_failures_become_empty_list() {
        assert!(list_or_empty(&FailingListing).is_empty());
        assert!(list_or_empty(&EmptyListing).is_empty());
    }
}
