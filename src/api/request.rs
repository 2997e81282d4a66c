//! Request descriptors.

use reqwest::Method;
use serde_json::Value;

/// A file to upload as a multipart attachment.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name reported to the service.
    pub file_name: String,
    /// MIME type; the service guesses when absent.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment from raw bytes.
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data,
        }
    }

    /// Set the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// A request body.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// A JSON document.
    Json(Value),
    /// A multipart upload with a single `file` part.
    File(Attachment),
}

/// Everything needed to perform one logical request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL without query string.
    pub url: String,
    /// Query parameters, sent in order.
    pub query: Vec<(String, String)>,
    /// Optional body.
    pub body: Option<RequestBody>,
    /// Whether this is one page of a paginated search.
    pub expects_pages: bool,
    /// The identifier being acted on, reported by `NotFound`.
    pub resource: String,
}

impl RequestDescriptor {
    fn new(method: Method, url: String, resource: impl Into<String>) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            body: None,
            expects_pages: false,
            resource: resource.into(),
        }
    }

    /// A GET request.
    pub fn get(url: String, resource: impl Into<String>) -> Self {
        Self::new(Method::GET, url, resource)
    }

    /// A POST request.
    pub fn post(url: String, resource: impl Into<String>) -> Self {
        Self::new(Method::POST, url, resource)
    }

    /// A PUT request.
    pub fn put(url: String, resource: impl Into<String>) -> Self {
        Self::new(Method::PUT, url, resource)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Set a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Set a multipart file body.
    pub fn file(mut self, attachment: Attachment) -> Self {
        self.body = Some(RequestBody::File(attachment));
        self
    }

    /// Mark as one page of a paginated search.
    pub fn paged(mut self) -> Self {
        self.expects_pages = true;
        self
    }

    /// Whether repeating the request cannot create duplicate effects.
    ///
    /// GET and PUT are idempotent; POST creates resources.
    pub fn is_idempotent(&self) -> bool {
        self.method != Method::POST
    }

    /// Value of a query parameter, if set.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_query_order() {
        let request = RequestDescriptor::get("https://x/search".into(), "search")
            .query("jql", "project = RFID")
            .query("maxResults", "50")
            .paged();

        assert_eq!(request.method, Method::GET);
        assert!(request.expects_pages);
        assert_eq!(
            request.query,
            vec![
                ("jql".to_string(), "project = RFID".to_string()),
                ("maxResults".to_string(), "50".to_string()),
            ]
        );
        assert_eq!(request.query_value("maxResults"), Some("50"));
        assert_eq!(request.query_value("startAt"), None);
    }

    #[test]
    fn test_idempotency_by_method() {
        assert!(RequestDescriptor::get("u".into(), "r").is_idempotent());
        assert!(RequestDescriptor::put("u".into(), "r").is_idempotent());
        assert!(!RequestDescriptor::post("u".into(), "r").is_idempotent());
    }

    #[test]
    fn test_attachment_debug_hides_bytes() {
        let attachment = Attachment::new("a.txt", b"secret bytes".to_vec());
        let debug_output = format!("{:?}", attachment);
        assert!(debug_output.contains("a.txt"));
        assert!(!debug_output.contains("secret"));
    }
}
