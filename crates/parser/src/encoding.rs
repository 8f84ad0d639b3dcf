use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;
use percent_encoding::percent_decode_str;
use tracing::warn;
use url::Url;

use sitemapper_core::{SitemapError, SuccessResponse};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// True when the response looks like it contains gzipped data: the
/// decoded URL path ends in `.gz`, or the Content-Type mentions gzip.
pub(crate) fn response_is_gzipped(url: &str, response: &SuccessResponse) -> bool {
    let path_ends_in_gz = Url::parse(url)
        .ok()
        .map(|parsed| {
            let path = percent_decode_str(parsed.path()).decode_utf8_lossy();
            path.to_ascii_lowercase().ends_with(".gz")
        })
        .unwrap_or(false);

    let content_type = response.header("content-type").unwrap_or_default();

    path_ends_in_gz || content_type.to_ascii_lowercase().contains("gzip")
}

pub(crate) fn gunzip(data: &[u8]) -> Result<Vec<u8>, SitemapError> {
    if data.is_empty() {
        // No way an empty string is a valid gzip archive
        return Err(SitemapError::Gunzip("data is empty".to_string()));
    }

    let mut decoder = GzDecoder::new(data);
    let mut gunzipped = Vec::new();
    decoder
        .read_to_end(&mut gunzipped)
        .map_err(|err| SitemapError::Gunzip(format!("unable to gunzip data: {err}")))?;

    Ok(gunzipped)
}

/// Decode bytes as UTF-8, stripping a leading BOM and substituting the
/// replacement character on invalid sequences.
pub(crate) fn decode_utf8(data: &[u8]) -> String {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    String::from_utf8_lossy(data).into_owned()
}

/// Decoded response content, gunzipped first if necessary.
pub(crate) fn ungzipped_response_content(url: &str, response: &SuccessResponse) -> String {
    let raw = response.raw_data();

    let data: Cow<'_, [u8]> = if response_is_gzipped(url, response) {
        match gunzip(raw) {
            Ok(gunzipped) => Cow::Owned(gunzipped),
            Err(err) => {
                // Assume it's one of the non-gzipped sitemaps with a ".gz"
                // extension and carry on with the raw bytes
                warn!(url = %url, error = %err, "unable to gunzip response");
                Cow::Borrowed(raw)
            }
        }
    } else {
        Cow::Borrowed(raw)
    };

    decode_utf8(&data)
}
