//! Content-Disposition header construction.
//!
//! Filenames can contain characters that are not valid in an HTTP header, so
//! the value carries both a sanitized ASCII `filename` and an RFC 5987
//! `filename*` with the percent-encoded original.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

// Characters that need escaping in the filename* ext-value
const ATTR_CHAR_ESCAPES: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'{')
    .add(b'}');

fn ascii_fallback(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Build a Content-Disposition header value.
/// `disposition` must be `"inline"` or `"attachment"`.
pub fn content_disposition(disposition: &str, filename: &str) -> String {
    let fallback = ascii_fallback(filename);
    let encoded = utf8_percent_encode(filename, ATTR_CHAR_ESCAPES);
    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition, fallback, encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_filename() {
        let value = content_disposition("attachment", "movie.mp4");
        assert_eq!(
            value,
            "attachment; filename=\"movie.mp4\"; filename*=UTF-8''movie.mp4"
        );
    }

    #[test]
    fn unicode_filename_gets_ascii_fallback() {
        let value = content_disposition("inline", "vidéo.mp4");
        assert!(value.starts_with("inline; filename=\"vid_o.mp4\""));
        assert!(value.contains("filename*=UTF-8''vid%C3%A9o.mp4"));
    }

    #[test]
    fn quotes_and_backslashes_do_not_break_the_header() {
        let value = content_disposition("attachment", "a\"b\\c.mp4");
        assert!(value.contains("filename=\"a_b_c.mp4\""));
        assert!(!value.contains("filename=\"a\"b"));
    }
}
