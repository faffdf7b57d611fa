//! Compression middleware
//!
//! Gzip-encodes response bodies when the client's `Accept-Encoding` allows
//! it. A failed encode leaves the response untouched.

use super::Middleware;
use crate::{Error, Request, Response, Result};
use bytes::Bytes;
use std::str::FromStr;

/// Content coding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gzip,
    Identity,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Gzip => "gzip",
            Encoding::Identity => "identity",
        }
    }

    /// Parse from Accept-Encoding header
    ///
    /// `gzip` (or `x-gzip`) with a non-zero q-value selects gzip. `*` selects
    /// gzip too unless gzip is listed explicitly.
    pub fn from_accept_encoding(header: &str) -> Self {
        let mut gzip: Option<f32> = None;
        let mut wildcard: Option<f32> = None;

        for item in header.split(',') {
            let mut parts = item.split(';');
            let coding = parts.next().unwrap_or("").trim();
            if coding.is_empty() {
                continue;
            }
            let q = quality(parts);

            if coding.eq_ignore_ascii_case("gzip") || coding.eq_ignore_ascii_case("x-gzip") {
                gzip = Some(gzip.map_or(q, |prev| prev.max(q)));
            } else if coding == "*" {
                wildcard = Some(q);
            }
        }

        match gzip.or(wildcard) {
            Some(q) if q > 0.0 => Encoding::Gzip,
            _ => Encoding::Identity,
        }
    }
}

/// q-value of one Accept-Encoding item; absent means 1, malformed means 0
fn quality<'a>(params: impl Iterator<Item = &'a str>) -> f32 {
    for param in params {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim().eq_ignore_ascii_case("q") {
                return value
                    .trim()
                    .parse::<f32>()
                    .ok()
                    .filter(|q| (0.0..=1.0).contains(q))
                    .unwrap_or(0.0);
            }
        }
    }
    1.0
}

/// Compression level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    Fast,
    #[default]
    Default,
    Best,
}

impl CompressionLevel {
    #[cfg_attr(not(feature = "compress"), allow(dead_code))]
    fn gzip_level(&self) -> u32 {
        match self {
            CompressionLevel::Fast => 1,
            CompressionLevel::Default => 6,
            CompressionLevel::Best => 9,
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(CompressionLevel::Fast),
            "default" => Ok(CompressionLevel::Default),
            "best" => Ok(CompressionLevel::Best),
            _ => Err(Error::Parse(format!("unknown compression level: {}", s))),
        }
    }
}

/// Compress middleware
#[derive(Debug, Clone)]
pub struct Compress {
    level: CompressionLevel,
    min_size: usize,
}

impl Compress {
    pub fn new() -> Self {
        Self {
            level: CompressionLevel::Default,
            min_size: 0,
        }
    }

    pub fn level(mut self, level: CompressionLevel) -> Self {
        self.level = level;
        self
    }

    pub fn min_size(mut self, size: usize) -> Self {
        self.min_size = size;
        self
    }

    fn should_compress(&self, content_type: &str, size: usize) -> bool {
        if size == 0 || size < self.min_size {
            return false;
        }

        // Compress text-based content
        content_type.starts_with("text/")
            || content_type.contains("json")
            || content_type.contains("xml")
            || content_type.contains("javascript")
            || content_type.contains("css")
    }

    fn encode(&self, encoding: Encoding, data: &[u8]) -> Result<Vec<u8>> {
        match encoding {
            Encoding::Gzip => self.compress_gzip(data),
            Encoding::Identity => Ok(data.to_vec()),
        }
    }

    #[cfg(feature = "compress")]
    fn compress_gzip(&self, data: &[u8]) -> Result<Vec<u8>> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(
            Vec::with_capacity(data.len() + 32),
            Compression::new(self.level.gzip_level()),
        );
        encoder
            .write_all(data)
            .map_err(|e| Error::Compression(e.to_string()))?;
        encoder.finish().map_err(|e| Error::Compression(e.to_string()))
    }

    #[cfg(not(feature = "compress"))]
    fn compress_gzip(&self, _data: &[u8]) -> Result<Vec<u8>> {
        Err(Error::Compression("gzip support not compiled in".to_string()))
    }

    /// Install an encoded body, or keep the original one if encoding failed
    fn apply(res: &mut Response, encoding: Encoding, encoded: Result<Vec<u8>>) {
        match encoded {
            Ok(body) => {
                res.body = Bytes::from(body);
                res.headers
                    .retain(|(k, _)| !k.eq_ignore_ascii_case("content-length"));
                res.append_header("Content-Encoding", encoding.as_str());
            }
            Err(e) => {
                tracing::warn!(error = %e, "compression failed, sending identity body");
            }
        }
    }
}

impl Default for Compress {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for Compress {
    fn after(&self, req: &Request, res: &mut Response) {
        let accept = match req.accept_encoding() {
            Some(accept) if !accept.is_empty() => accept,
            _ => return,
        };

        if res.has_header("content-encoding") {
            return;
        }

        let content_type = res.content_type().unwrap_or("");
        if !self.should_compress(content_type, res.body.len()) {
            return;
        }

        let encoding = Encoding::from_accept_encoding(accept);
        if encoding == Encoding::Identity {
            return;
        }

        let encoded = self.encode(encoding, &res.body);
        Self::apply(res, encoding, encoded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Handler, HandlerExt, Plaintext};
    use crate::RequestBuilder;
    use http::Method;

    fn request(accept: Option<&str>) -> Request {
        let builder = RequestBuilder::new(Method::GET, "/plaintext");
        match accept {
            Some(v) => builder.header("Accept-Encoding", v).build(),
            None => builder.build(),
        }
    }

    #[test]
    fn test_encoding_parse() {
        assert_eq!(Encoding::from_accept_encoding("gzip"), Encoding::Gzip);
        assert_eq!(Encoding::from_accept_encoding("gzip, deflate, br"), Encoding::Gzip);
        assert_eq!(Encoding::from_accept_encoding("deflate, GZIP;q=0.5"), Encoding::Gzip);
        assert_eq!(Encoding::from_accept_encoding("x-gzip"), Encoding::Gzip);
        assert_eq!(Encoding::from_accept_encoding("*"), Encoding::Gzip);
        assert_eq!(Encoding::from_accept_encoding("deflate, br"), Encoding::Identity);
        assert_eq!(Encoding::from_accept_encoding(""), Encoding::Identity);
        assert_eq!(Encoding::from_accept_encoding("identity"), Encoding::Identity);
    }

    #[test]
    fn test_encoding_q_zero_refuses() {
        assert_eq!(Encoding::from_accept_encoding("gzip;q=0"), Encoding::Identity);
        assert_eq!(Encoding::from_accept_encoding("gzip; q=0.0, *"), Encoding::Identity);
        assert_eq!(Encoding::from_accept_encoding("*;q=0"), Encoding::Identity);
        assert_eq!(Encoding::from_accept_encoding("gzip;q=abc"), Encoding::Identity);
        assert_eq!(Encoding::from_accept_encoding("gzip;q=0, gzip;q=1"), Encoding::Gzip);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("fast".parse::<CompressionLevel>().unwrap(), CompressionLevel::Fast);
        assert_eq!("BEST".parse::<CompressionLevel>().unwrap(), CompressionLevel::Best);
        assert!("max".parse::<CompressionLevel>().is_err());
    }

    #[test]
    fn test_should_compress() {
        let compress = Compress::new();

        assert!(compress.should_compress("text/plain; charset=UTF-8", 15));
        assert!(compress.should_compress("application/json", 2000));
        assert!(!compress.should_compress("image/png", 2000));
        assert!(!compress.should_compress("text/plain", 0));
        assert!(!Compress::new().min_size(1024).should_compress("text/html", 500));
    }

    #[test]
    fn test_no_accept_encoding_passthrough() {
        let handler = Plaintext.wrap(Compress::new());
        for accept in [None, Some(""), Some("br"), Some("gzip;q=0")] {
            let res = handler.handle(&request(accept));
            assert_eq!(&res.body[..], b"Hello, World!\r\n");
            assert!(!res.has_header("Content-Encoding"));
        }
    }

    #[test]
    fn test_already_encoded_untouched() {
        let compress = Compress::new();
        let mut res = Plaintext.handle(&request(None));
        res.append_header("Content-Encoding", "br");
        compress.after(&request(Some("gzip")), &mut res);
        assert_eq!(&res.body[..], b"Hello, World!\r\n");
        assert_eq!(res.header("content-encoding"), Some("br"));
    }

    #[test]
    fn test_failure_keeps_identity_body() {
        let mut res = Plaintext.handle(&request(Some("gzip")));
        res.append_header("Content-Length", "15");
        Compress::apply(
            &mut res,
            Encoding::Gzip,
            Err(Error::Compression("boom".to_string())),
        );
        assert_eq!(&res.body[..], b"Hello, World!\r\n");
        assert!(!res.has_header("Content-Encoding"));
        assert_eq!(res.header("content-length"), Some("15"));
    }

    #[cfg(feature = "compress")]
    #[test]
    fn test_gzip_round_trip() {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let handler = Plaintext.wrap(Compress::new().level(CompressionLevel::Best));
        let res = handler.handle(&request(Some("gzip, deflate")));

        assert_eq!(res.header("Content-Encoding"), Some("gzip"));
        assert_eq!(res.header("Content-Type"), Some("text/plain; charset=UTF-8"));
        assert_eq!(res.header("Server"), Some("Example"));
        assert_eq!(res.header("Date"), Some("Wed, 17 Apr 2013 12:00:00 GMT"));
        assert_eq!(&res.body[..2], &[0x1f, 0x8b]);

        let mut decoded = Vec::new();
        GzDecoder::new(&res.body[..]).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, b"Hello, World!\r\n");
    }

    #[cfg(feature = "compress")]
    #[test]
    fn test_gzip_deterministic() {
        let handler = Plaintext.wrap(Compress::new());
        let a = handler.handle(&request(Some("gzip")));
        let b = handler.handle(&request(Some("gzip")));
        assert_eq!(a.body, b.body);
        assert_eq!(a.headers, b.headers);
    }

    #[cfg(feature = "compress")]
    #[test]
    fn test_content_length_replaced() {
        let compress = Compress::new();
        let mut res = Plaintext.handle(&request(None));
        res.append_header("Content-Length", "15");
        compress.after(&request(Some("gzip")), &mut res);
        assert!(!res.has_header("content-length"));
        assert_eq!(res.header("content-encoding"), Some("gzip"));
    }
}
