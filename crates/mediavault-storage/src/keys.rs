//! Storage key generation
//!
//! All backends share the same key layout, so generation lives here rather
//! than in each backend.

use uuid::Uuid;

/// Replace any character outside `[A-Za-z0-9._-]` with `_` so keys stay safe
/// across backends and URLs.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Key for an uploaded media blob: `media/{tenant_id}/{timestamp}-{filename}`.
/// The millisecond timestamp keeps repeated uploads of the same filename from
/// colliding.
pub fn generate_media_key(tenant_id: Uuid, filename: &str) -> String {
    let ts = chrono::Utc::now().timestamp_millis();
    format!("media/{}/{}-{}", tenant_id, ts, sanitize_filename(filename))
}

/// Deterministic key for a video's thumbnail. Regeneration overwrites the
/// previous thumbnail in place.
pub fn thumbnail_key(tenant_id: Uuid, video_id: Uuid) -> String {
    format!("media/{}/thumbnails/{}.jpg", tenant_id, video_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("movie.mp4"), "movie.mp4");
        assert_eq!(sanitize_filename("my movie (1).mp4"), "my_movie__1_.mp4");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("héllo.mov"), "h_llo.mov");
    }

    #[test]
    fn test_generate_media_key_is_tenant_scoped() {
        let tenant_id = Uuid::new_v4();
        let key = generate_media_key(tenant_id, "clip.mp4");
        assert!(key.starts_with(&format!("media/{}/", tenant_id)));
        assert!(key.ends_with("-clip.mp4"));
        assert!(!key.contains(".."));
    }

    #[test]
    fn test_thumbnail_key_is_deterministic() {
        let tenant_id = Uuid::new_v4();
        let video_id = Uuid::new_v4();
        let a = thumbnail_key(tenant_id, video_id);
        let b = thumbnail_key(tenant_id, video_id);
        assert_eq!(a, b);
        assert_eq!(a, format!("media/{}/thumbnails/{}.jpg", tenant_id, video_id));
    }
}
