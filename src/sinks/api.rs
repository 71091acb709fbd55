//! HTTP API sink
//!
//! Sends each message's fields to an HTTP endpoint, as a query string for
//! `GET` or a url-encoded form for `POST`.

use crate::core::{ApiConfig, HttpMethod, LoggerError, Message, Result, Sink, SinkConfig};
use reqwest::blocking::Client;
use std::time::Duration;

/// Request timeout when the config does not set one
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Default)]
pub struct ApiSink {
    client: Option<Client>,
    config: ApiConfig,
}

impl ApiSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate(config: &ApiConfig) -> Result<()> {
        if config.url.is_empty() {
            return Err(LoggerError::config("ApiSink", "url cannot be empty"));
        }
        if config.verify && config.verify_code == 0 {
            return Err(LoggerError::config(
                "ApiSink",
                "verify_code cannot be 0 when verify is set",
            ));
        }
        Ok(())
    }
}

impl Sink for ApiSink {
    fn name(&self) -> &str {
        "api"
    }

    fn init(&mut self, config: &SinkConfig) -> Result<()> {
        let SinkConfig::Api(config) = config else {
            return Err(LoggerError::config(
                "ApiSink",
                format!("expected an api config, got '{}'", config.kind()),
            ));
        };
        Self::validate(config)?;

        let timeout = config
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_API_TIMEOUT);
        let client = Client::builder().timeout(timeout).no_proxy().build()?;

        self.client = Some(client);
        self.config = config.clone();
        Ok(())
    }

    fn write(&mut self, message: &Message) -> Result<()> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| LoggerError::other("ApiSink used before init"))?;

        let fields = message.to_fields();
        let mut request = match self.config.method {
            HttpMethod::Get => client.get(self.config.url.as_str()).query(&fields),
            HttpMethod::Post => client.post(self.config.url.as_str()).form(&fields),
        };
        for (key, value) in &self.config.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send()?;
        let code = response.status().as_u16();
        if self.config.verify && code != self.config.verify_code {
            return Err(LoggerError::ApiStatus {
                url: self.config.url.clone(),
                code,
            });
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallSite, Severity};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Accept one request, answer with `status`, hand back the raw request
    fn serve_once(status: u16) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/logs", listener.local_addr().unwrap());
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                let done = line == "\r\n";
                head.push_str(&line);
                if done {
                    break;
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();
            head.push_str(&String::from_utf8(body).unwrap());

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {} X\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            )
            .unwrap();
            tx.send(head).unwrap();
        });

        (url, rx)
    }

    fn message(body: &str) -> Message {
        Message::new(Severity::Error, body, CallSite::new("src/api.rs", 12, "app::api"))
    }

    fn init(config: ApiConfig) -> ApiSink {
        let mut sink = ApiSink::new();
        sink.init(&SinkConfig::Api(config)).unwrap();
        sink
    }

    #[test]
    fn test_init_validation() {
        let mut sink = ApiSink::new();
        let err = sink
            .init(&SinkConfig::Api(ApiConfig::new("", HttpMethod::Get)))
            .unwrap_err();
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let mut config = ApiConfig::new("http://127.0.0.1:1/", HttpMethod::Post);
        config.verify = true;
        assert!(sink.init(&SinkConfig::Api(config)).is_err());

        let method: std::result::Result<HttpMethod, _> = serde_json::from_str(r#""PUT""#);
        assert!(method.is_err());
    }

    #[test]
    fn test_get_sends_query_string() {
        let (url, requests) = serve_once(200);
        let mut sink = init(ApiConfig::new(url, HttpMethod::Get).with_header("X-Token", "abc"));

        sink.write(&message("disk full")).unwrap();

        let request = requests.recv().unwrap();
        assert!(request.starts_with("GET /logs?"), "{}", request);
        assert!(request.contains("body=disk+full"), "{}", request);
        assert!(request.contains("level_string=Error"), "{}", request);
        assert!(request.to_ascii_lowercase().contains("x-token: abc"), "{}", request);
    }

    #[test]
    fn test_post_sends_form() {
        let (url, requests) = serve_once(200);
        let mut sink = init(ApiConfig::new(url, HttpMethod::Post).with_verify(200));

        sink.write(&message("hello")).unwrap();

        let request = requests.recv().unwrap();
        assert!(request.starts_with("POST /logs "), "{}", request);
        assert!(request
            .to_ascii_lowercase()
            .contains("content-type: application/x-www-form-urlencoded"));
        assert!(request.contains("body=hello"));
        assert!(request.contains("level=3"));
        assert!(request.contains("function=app%3A%3Aapi"));
    }

    #[test]
    fn test_verify_rejects_unexpected_status() {
        let (url, _requests) = serve_once(500);
        let mut sink = init(ApiConfig::new(url, HttpMethod::Post).with_verify(200));

        let err = sink.write(&message("x")).unwrap_err();
        assert!(matches!(err, LoggerError::ApiStatus { code: 500, .. }));
    }

    #[test]
    fn test_unverified_status_is_ignored() {
        let (url, _requests) = serve_once(503);
        let mut sink = init(ApiConfig::new(url, HttpMethod::Get));
        sink.write(&message("x")).unwrap();
    }
}
