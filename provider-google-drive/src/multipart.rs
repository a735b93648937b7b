//! `multipart/related` body writer for Drive uploads.
//!
//! Drive's multipart upload takes a JSON metadata part followed by the media
//! part. The boundary is a random token drawn again until it occurs in no
//! part, so document content can never terminate a part early.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Part {
    content_type: String,
    body: Bytes,
}

/// Builder for a `multipart/related` request body.
#[derive(Debug, Clone, Default)]
pub struct MultipartRelated {
    parts: Vec<Part>,
}

/// A finished body with the boundary it was written with.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub boundary: String,
    pub body: Bytes,
}

impl MultipartBody {
    /// Value for the request's `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/related; boundary={}", self.boundary)
    }
}

impl MultipartRelated {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part(mut self, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.parts.push(Part {
            content_type: content_type.into(),
            body: body.into(),
        });
        self
    }

    /// Write the body with a random boundary.
    pub fn finish(self) -> MultipartBody {
        self.finish_with(random_boundary)
    }

    /// Write the body, drawing boundaries from `next_boundary` until one is
    /// absent from every part.
    pub fn finish_with<F>(self, mut next_boundary: F) -> MultipartBody
    where
        F: FnMut() -> String,
    {
        let boundary = loop {
            let candidate = next_boundary();
            if !candidate.is_empty() && !self.collides(&candidate) {
                break candidate;
            }
        };

        let mut body = BytesMut::new();
        for part in &self.parts {
            body.put_slice(b"--");
            body.put_slice(boundary.as_bytes());
            body.put_slice(b"\r\nContent-Type: ");
            body.put_slice(part.content_type.as_bytes());
            body.put_slice(b"\r\n\r\n");
            body.put_slice(&part.body);
            body.put_slice(b"\r\n");
        }
        body.put_slice(b"--");
        body.put_slice(boundary.as_bytes());
        body.put_slice(b"--");

        MultipartBody {
            boundary,
            body: body.freeze(),
        }
    }

    fn collides(&self, boundary: &str) -> bool {
        let needle = boundary.as_bytes();
        self.parts.iter().any(|part| {
            part.body
                .windows(needle.len())
                .any(|window| window == needle)
        })
    }
}

fn random_boundary() -> String {
    format!("accountable_{}", Uuid::new_v4().simple())
}
