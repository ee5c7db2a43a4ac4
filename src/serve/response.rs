//! HTTP response handlers.

use anyhow::{Context, Result};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::reload;
use crate::utils::mime::types::{HTML, JAVASCRIPT, PLAIN};

/// Respond with a static file, injecting the live reload script into HTML.
pub fn respond_file(request: Request, path: &Path) -> Result<()> {
    let content_type = crate::utils::mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let body = maybe_inject_reload(body, content_type);

    send_body(request, 200, content_type, body)
}

/// Respond with 404 (custom `404.html` under the root when present).
pub fn respond_not_found(request: Request, root: &Path) -> Result<()> {
    let custom_404 = root.join("404.html");
    let has_custom = custom_404.is_file();

    if is_head_request(&request) {
        let mime = if has_custom { HTML } else { PLAIN };
        return send_head(request, 404, mime);
    }

    if has_custom && let Ok(body) = fs::read(&custom_404) {
        let body = maybe_inject_reload(body, HTML);
        return send_body(request, 404, HTML, body);
    }

    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with the live reload client.
pub fn respond_client_js(request: Request, reload_port: u16) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, JAVASCRIPT);
    }
    send_body(
        request,
        200,
        JAVASCRIPT,
        reload::client_js(reload_port).into_bytes(),
    )
}

/// Inject the client script if the response is HTML.
pub fn maybe_inject_reload(body: Vec<u8>, content_type: &str) -> Vec<u8> {
    if content_type.starts_with("text/html") {
        inject_script(&body, reload::client_tag().as_bytes())
    } else {
        body
    }
}

/// Insert `script` before the last `</body>`, or append when there is none.
fn inject_script(content: &[u8], script: &[u8]) -> Vec<u8> {
    const PATTERN: &[u8] = b"</body>";

    let pos = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + script.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(script);
    result.extend_from_slice(&content[pos..]);
    result
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response = Response::empty(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?)
        .with_header(make_header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?)
        .with_header(make_header("Cache-Control", "no-cache")?);
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow::anyhow!("invalid header {key}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &[u8] = b"<script></script>";

    #[test]
    fn test_inject_before_body_close() {
        let html = b"<html><body><p>hi</p></body></html>";
        let out = inject_script(html, TAG);
        assert_eq!(
            out,
            b"<html><body><p>hi</p><script></script></body></html>".to_vec()
        );
    }

    #[test]
    fn test_inject_uses_last_body_and_ignores_case() {
        let html = b"<body><pre>&lt;/body&gt; </body></pre></BODY>";
        let out = String::from_utf8(inject_script(html, TAG)).unwrap();
        assert!(out.ends_with("<script></script></BODY>"));
    }

    #[test]
    fn test_inject_appends_without_body() {
        let out = inject_script(b"<p>fragment</p>", TAG);
        assert_eq!(out, b"<p>fragment</p><script></script>".to_vec());
    }

    #[test]
    fn test_only_html_is_injected() {
        let css = b"body{}".to_vec();
        assert_eq!(maybe_inject_reload(css.clone(), "text/css; charset=utf-8"), css);

        let html = maybe_inject_reload(b"<body></body>".to_vec(), HTML);
        assert!(String::from_utf8(html).unwrap().contains(reload::CLIENT_PATH));
    }
}
