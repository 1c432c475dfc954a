//! In-process S3 endpoint for tests.
//!
//! Serves path-style requests for one bucket over plain HTTP: ListObjectsV2
//! (prefix, delimiter, max-keys, continuation tokens), GET, HEAD and PUT on
//! objects. Account-level calls such as ListBuckets (`GET /`) are refused
//! with 403, the way bucket-scoped credentials are.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Default)]
struct State {
    objects: BTreeMap<String, Vec<u8>>,
    requests: Vec<String>,
    page_size: Option<usize>,
    missing_bucket: bool,
    pages_before_failure: Option<usize>,
    pages_served: usize,
}

struct Reply {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

impl Reply {
    fn xml(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/xml",
            body: body.into_bytes(),
        }
    }

    fn error(status: u16, code: &str) -> Self {
        Self::xml(status, format!("<Error><Code>{}</Code></Error>", code))
    }
}

pub struct StubS3 {
    url: String,
    bucket: String,
    state: Arc<Mutex<State>>,
}

impl StubS3 {
    pub fn start(bucket: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let state = Arc::new(Mutex::new(State::default()));

        let shared = Arc::clone(&state);
        let name = bucket.to_string();
        thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => serve(stream, &name, &shared),
                    Err(_) => break,
                }
            }
        });

        Self {
            url,
            bucket: bucket.to_string(),
            state,
        }
    }

    /// `http://127.0.0.1:<port>`, usable as a profile HOSTNAME.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn insert(&self, key: &str, body: &[u8]) {
        self.lock().objects.insert(key.to_string(), body.to_vec());
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().objects.get(key).cloned()
    }

    /// Request lines seen so far, e.g. `GET /copycat/env_prod`.
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    /// Caps every listing page at `n` entries.
    pub fn page_size(&self, n: usize) {
        self.lock().page_size = Some(n);
    }

    /// Answers every bucket request with `NoSuchBucket`.
    pub fn remove_bucket(&self) {
        self.lock().missing_bucket = true;
    }

    /// Serves `pages` listing pages, then refuses further ones.
    pub fn fail_listing_after(&self, pages: usize) {
        self.lock().pages_before_failure = Some(pages);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }
}

fn serve(stream: TcpStream, bucket: &str, state: &Mutex<State>) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0; length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    let reply = {
        let mut state = state.lock().unwrap();
        state.requests.push(format!("{} {}", method, target));
        respond(&mut state, bucket, &method, &target, body)
    };

    let head = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nETag: \"stub\"\r\nConnection: close\r\n\r\n",
        reply.status,
        reply.content_type,
        reply.body.len()
    );
    let mut stream = stream;
    let _ = stream.write_all(head.as_bytes());
    if method != "HEAD" {
        let _ = stream.write_all(&reply.body);
    }
    let _ = stream.flush();
}

fn respond(state: &mut State, bucket: &str, method: &str, target: &str, body: Vec<u8>) -> Reply {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let path = decode(path);

    if path == "/" {
        return Reply::error(403, "AccessDenied");
    }
    let Some(rest) = path.strip_prefix(&format!("/{}", bucket)) else {
        return Reply::error(404, "NoSuchBucket");
    };
    if state.missing_bucket {
        return Reply::error(404, "NoSuchBucket");
    }

    let key = rest.trim_start_matches('/');
    if key.is_empty() {
        return match method {
            "GET" => list(state, bucket, query),
            _ => Reply::xml(200, String::new()),
        };
    }

    match method {
        "GET" | "HEAD" => match state.objects.get(key) {
            Some(object) => Reply {
                status: 200,
                content_type: "application/octet-stream",
                body: object.clone(),
            },
            None => Reply::error(404, "NoSuchKey"),
        },
        "PUT" => {
            state.objects.insert(key.to_string(), body);
            Reply::xml(200, String::new())
        }
        _ => Reply::error(405, "MethodNotAllowed"),
    }
}

enum Entry {
    Key(String, usize),
    Prefix(String),
}

fn list(state: &mut State, bucket: &str, query: &str) -> Reply {
    if let Some(limit) = state.pages_before_failure {
        if state.pages_served >= limit {
            return Reply::error(403, "AccessDenied");
        }
    }
    state.pages_served += 1;

    let params: BTreeMap<String, String> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(name), decode(value))
        })
        .collect();
    let prefix = params.get("prefix").cloned().unwrap_or_default();
    let delimiter = params.get("delimiter").cloned().filter(|d| !d.is_empty());
    let start: usize = params
        .get("continuation-token")
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);
    let mut max_keys: usize = params
        .get("max-keys")
        .and_then(|m| m.parse().ok())
        .unwrap_or(1000);
    if let Some(size) = state.page_size {
        max_keys = max_keys.min(size);
    }

    let mut entries: Vec<Entry> = Vec::new();
    for (key, body) in state.objects.iter() {
        let Some(rest) = key.strip_prefix(prefix.as_str()) else {
            continue;
        };
        let folded = delimiter
            .as_deref()
            .and_then(|d| rest.find(d).map(|idx| format!("{}{}", prefix, &rest[..idx + d.len()])));
        match folded {
            Some(common) => {
                let seen = matches!(entries.last(), Some(Entry::Prefix(last)) if *last == common);
                if !seen {
                    entries.push(Entry::Prefix(common));
                }
            }
            None => entries.push(Entry::Key(key.clone(), body.len())),
        }
    }

    let end = (start + max_keys).min(entries.len());
    let page = &entries[start.min(end)..end];
    let truncated = end < entries.len();

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">"#,
    );
    xml.push_str(&format!(
        "<Name>{}</Name><Prefix>{}</Prefix><KeyCount>{}</KeyCount><MaxKeys>{}</MaxKeys>",
        escape(bucket),
        escape(&prefix),
        page.len(),
        max_keys
    ));
    if let Some(d) = &delimiter {
        xml.push_str(&format!("<Delimiter>{}</Delimiter>", escape(d)));
    }
    xml.push_str(&format!("<IsTruncated>{}</IsTruncated>", truncated));
    if truncated {
        xml.push_str(&format!(
            "<NextContinuationToken>{}</NextContinuationToken>",
            end
        ));
    }
    for entry in page {
        if let Entry::Key(key, size) = entry {
            xml.push_str(&format!(
                "<Contents><Key>{}</Key><LastModified>2024-01-01T00:00:00.000Z</LastModified><ETag>\"stub\"</ETag><Size>{}</Size><StorageClass>STANDARD</StorageClass></Contents>",
                escape(key),
                size
            ));
        }
    }
    for entry in page {
        if let Entry::Prefix(common) = entry {
            xml.push_str(&format!(
                "<CommonPrefixes><Prefix>{}</Prefix></CommonPrefixes>",
                escape(common)
            ));
        }
    }
    xml.push_str("</ListBucketResult>");
    Reply::xml(200, xml)
}

fn decode(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
