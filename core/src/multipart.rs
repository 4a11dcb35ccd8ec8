//! In-memory multipart/form-data writer.
//!
//! Parts are appended to a single buffer as they are added, so a file
//! reader can be dropped as soon as its contents are copied.

use std::io::{self, Read};

use uuid::Uuid;

/// Builder for a `multipart/form-data` request body.
#[derive(Debug)]
pub struct MultipartForm {
    boundary: String,
    buffer: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(&Uuid::new_v4().simple().to_string())
    }

    pub fn with_boundary(boundary: &str) -> Self {
        Self {
            boundary: boundary.to_string(),
            buffer: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Append a text field.
    pub fn text(&mut self, name: &str, value: &str) {
        self.part_header(&format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n",
            escape_quotes(name)
        ));
        self.buffer.extend_from_slice(value.as_bytes());
    }

    /// Append a file part, copying everything `reader` yields.
    pub fn file<R: Read>(&mut self, name: &str, filename: &str, mut reader: R) -> io::Result<u64> {
        self.part_header(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n",
            escape_quotes(name),
            escape_quotes(filename)
        ));
        io::copy(&mut reader, &mut self.buffer)
    }

    /// Close the envelope and return the encoded body.
    pub fn finish(mut self) -> Vec<u8> {
        if !self.buffer.is_empty() {
            self.buffer.extend_from_slice(b"\r\n");
        }
        self.buffer
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.buffer
    }

    fn part_header(&mut self, headers: &str) {
        if !self.buffer.is_empty() {
            self.buffer.extend_from_slice(b"\r\n");
        }
        self.buffer
            .extend_from_slice(format!("--{}\r\n{headers}\r\n", self.boundary).as_bytes());
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
