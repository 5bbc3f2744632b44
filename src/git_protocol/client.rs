use super::{upload_pack, Head, RefAdvertisement};
use crate::{
    config::{Config, AGENT},
    Result,
};
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use tracing::{debug, info};

const UPLOAD_PACK_REQUEST: &str = "application/x-git-upload-pack-request";
const UPLOAD_PACK_RESULT: &str = "application/x-git-upload-pack-result";

/// Smart-HTTP client for a single remote. Calls block until the server
/// answers; deadlines are up to the caller.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    url: String,
    http: reqwest::Client,
    capabilities: String,
    fallback_branch: String,
}

impl RemoteClient {
    pub fn new(url: &str, config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder().user_agent(AGENT).build()?;
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            http,
            capabilities: config.capabilities.clone(),
            fallback_branch: config.fallback_branch.clone(),
        })
    }

    /// `GET <url>/info/refs?service=git-upload-pack`
    pub async fn discover(&self) -> Result<Head> {
        let url = format!("{}/info/refs?service=git-upload-pack", self.url);
        debug!(%url, "discovering refs");

        let body = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let head = RefAdvertisement::parse(&body)?.head(&self.fallback_branch)?;
        info!(branch = %head.branch, hash = %head.hash, "resolved HEAD");
        Ok(head)
    }

    /// `POST <url>/git-upload-pack` wanting `head`. The whole response body
    /// is returned, including any leading negotiation lines.
    pub async fn fetch(&self, head: &Head) -> Result<Bytes> {
        let url = format!("{}/git-upload-pack", self.url);
        let body = upload_pack::request_body(&head.hash, &self.capabilities);

        let mut stream = self
            .http
            .post(&url)
            .headers(upload_pack_headers())
            .body(body)
            .send()
            .await?
            .error_for_status()?
            .bytes_stream();

        let mut buf: Vec<u8> = vec![];
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
        }

        info!(%url, bytes = buf.len(), "received upload-pack response");
        Ok(Bytes::from(buf))
    }
}

// No `Expect` header: the request is small enough to go out without a
// 100-continue round trip.
fn upload_pack_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(UPLOAD_PACK_REQUEST));
    headers.insert(ACCEPT, HeaderValue::from_static(UPLOAD_PACK_RESULT));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git_protocol::PktLine;
    use crate::{Error, Sha1Hash};
    use reqwest::header::EXPECT;
    use wiremock::matchers::{body_bytes, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const HEX: &str = "3b1031798a00fdf9b574b5857b1721bc4b0e6bac";

    struct NoExpect;

    impl wiremock::Match for NoExpect {
        fn matches(&self, request: &Request) -> bool {
            !request.headers.contains_key("expect")
        }
    }

    fn advertisement() -> Vec<u8> {
        let head = format!("{HEX} HEAD\0symref=HEAD:refs/heads/trunk side-band-64k\n");
        [
            PktLine::new(b"# service=git-upload-pack\n".to_vec()).encode(),
            PktLine::flush().encode(),
            PktLine::new(head.into_bytes()).encode(),
            PktLine::flush().encode(),
        ]
        .concat()
    }

    #[test]
    fn it_sets_upload_pack_headers() {
        let headers = upload_pack_headers();
        assert_eq!(headers[CONTENT_TYPE], UPLOAD_PACK_REQUEST);
        assert_eq!(headers[ACCEPT], UPLOAD_PACK_RESULT);
        assert!(!headers.contains_key(EXPECT));
    }

    #[tokio::test]
    async fn it_discovers_head() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repo.git/info/refs"))
            .and(query_param("service", "git-upload-pack"))
            .and(header("user-agent", AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(advertisement()))
            .mount(&server)
            .await;

        let url = format!("{}/repo.git/", server.uri());
        let client = RemoteClient::new(&url, &Config::default()).unwrap();
        let head = client.discover().await.unwrap();
        assert_eq!(head.branch, "trunk");
        assert_eq!(head.hash.hex(), HEX);
    }

    #[tokio::test]
    async fn it_reports_http_status_as_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = RemoteClient::new(&server.uri(), &Config::default()).unwrap();
        let err = client.discover().await.unwrap_err();
        assert!(matches!(err, Error::Network(msg) if msg.contains("404")));
    }

    #[tokio::test]
    async fn it_posts_want_and_returns_whole_body() {
        let server = MockServer::start().await;
        let config = Config {
            capabilities: "ofs-delta".into(),
            ..Config::default()
        };
        let head = Head {
            branch: "master".into(),
            hash: Sha1Hash::from_hex(HEX).unwrap(),
        };
        let response = b"0008NAK\nPACK\x00\x00\x00\x02\x00\x00\x00\x00".to_vec();

        Mock::given(method("POST"))
            .and(path("/git-upload-pack"))
            .and(header("content-type", UPLOAD_PACK_REQUEST))
            .and(header("accept", UPLOAD_PACK_RESULT))
            .and(NoExpect)
            .and(body_bytes(upload_pack::request_body(&head.hash, "ofs-delta")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(response.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let client = RemoteClient::new(&server.uri(), &config).unwrap();
        let body = client.fetch(&head).await.unwrap();
        assert_eq!(body.len(), response.len());
        assert_eq!(body.as_ref(), response.as_slice());
    }
}
