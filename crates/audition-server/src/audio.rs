//! Serves audio clips from `<audio_dir>/<model>/<file>`.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::path::Path;

pub fn content_type_for(file: &str) -> &'static str {
    match Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// Both path segments must be plain file names.
fn is_safe_component(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && !s.contains('/')
        && !s.contains('\\')
        && !s.contains('\0')
}

pub fn clip_response(root: &Path, model: &str, file: &str) -> Response<Full<Bytes>> {
    if !is_safe_component(model) || !is_safe_component(file) {
        return status_response(StatusCode::BAD_REQUEST, "bad clip path");
    }
    let path = audition_core::manifest::audio_path(root, model, file);
    match std::fs::read(&path) {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", content_type_for(file))
            .header("Cache-Control", "no-store")
            .body(Full::new(Bytes::from(bytes)))
            .unwrap(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "clip not readable");
            status_response(StatusCode::NOT_FOUND, "clip not found")
        }
    }
}

fn status_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from(message.to_string())))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_by_extension() {
        assert_eq!(content_type_for("x.wav"), "audio/wav");
        assert_eq!(content_type_for("x.WAV"), "audio/wav");
        assert_eq!(content_type_for("x.mp3"), "audio/mpeg");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn traversal_components_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for (model, file) in [
            ("..", "secret.wav"),
            ("model", ".."),
            ("a/b", "x.wav"),
            ("model", "a\\b.wav"),
            ("", "x.wav"),
        ] {
            let resp = clip_response(dir.path(), model, file);
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{model}/{file}");
        }
    }

    #[test]
    fn serves_existing_clip_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("m")).unwrap();
        std::fs::write(dir.path().join("m/a.wav"), b"RIFFdata").unwrap();

        let resp = clip_response(dir.path(), "m", "a.wav");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Content-Type"], "audio/wav");
    }

    #[test]
    fn missing_clip_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let resp = clip_response(dir.path(), "m", "ghost.wav");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
