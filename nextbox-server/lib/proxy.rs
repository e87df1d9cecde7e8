//! Forwarding of browser requests to a sandbox preview.
//!
//! Previews of private sandboxes only answer requests carrying the preview token, and the
//! provider puts an interstitial warning page in front of browsers. The proxy adds both headers
//! so the app can be embedded in an iframe on the frontend, and rewrites root-relative asset
//! references in HTML and CSS so that they resolve through the proxy as well.

use std::sync::LazyLock;

use axum::{
    body::{self, Body},
    http::{
        header::{
            ACCEPT_ENCODING, CACHE_CONTROL, CONNECTION, CONTENT_ENCODING, CONTENT_LENGTH,
            CONTENT_SECURITY_POLICY, CONTENT_TYPE, HOST, ORIGIN, REFERRER_POLICY,
            TRANSFER_ENCODING, X_FRAME_OPTIONS,
        },
        HeaderMap, HeaderName, HeaderValue, Request,
    },
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use nextbox_core::provider::PreviewLink;
use regex::{Captures, Regex};

use crate::{ServerError, ServerResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The header carrying the preview access token
pub const PREVIEW_TOKEN_HEADER: HeaderName = HeaderName::from_static("x-daytona-preview-token");

/// The header that skips the provider's preview warning page
pub const SKIP_PREVIEW_WARNING_HEADER: HeaderName =
    HeaderName::from_static("x-daytona-skip-preview-warning");

/// The largest request body forwarded to a preview
pub const MAX_FORWARDED_BODY: usize = 16 * 1024 * 1024;

static DROPPED_REQUEST_HEADERS: [HeaderName; 6] = [
    HOST,
    ORIGIN,
    ACCEPT_ENCODING,
    CONTENT_LENGTH,
    CONNECTION,
    TRANSFER_ENCODING,
];

static DROPPED_RESPONSE_HEADERS: [HeaderName; 6] = [
    X_FRAME_OPTIONS,
    CONTENT_SECURITY_POLICY,
    REFERRER_POLICY,
    CONTENT_LENGTH,
    CONNECTION,
    TRANSFER_ENCODING,
];

static MARKUP_ASSET_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<attr>src|href)\s*=\s*(?P<quote>["'])/(?P<dir>_next|static)/"#)
        .expect("valid asset attribute pattern")
});

static STYLE_ASSET_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?P<quote>["']?)/(?P<dir>_next|static|fonts|images|media|img)/"#)
        .expect("valid asset url pattern")
});

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// The path prefix previews of a sandbox port are served under
pub fn proxy_prefix(sandbox_id: &str, port: u16) -> String {
    format!("/preview/{}/{}", sandbox_id, port)
}

/// Join the preview URL, the forwarded path and the incoming query string
pub fn target_url(preview_url: &str, path: &str, query: Option<&str>) -> String {
    let mut url = format!(
        "{}/{}",
        preview_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }

    url
}

/// Point root-relative Next.js asset references in an HTML document at the proxy
pub fn rewrite_html(body: &str, prefix: &str) -> String {
    let body = MARKUP_ASSET_ATTR.replace_all(body, |caps: &Captures| {
        format!(
            "{}={}{}/{}/",
            &caps["attr"], &caps["quote"], prefix, &caps["dir"]
        )
    });
    rewrite_css(&body, prefix)
}

/// Point root-relative `url(...)` references in a stylesheet at the proxy
pub fn rewrite_css(body: &str, prefix: &str) -> String {
    STYLE_ASSET_URL
        .replace_all(body, |caps: &Captures| {
            format!("url({}{}/{}/", &caps["quote"], prefix, &caps["dir"])
        })
        .into_owned()
}

/// Forward a request to a sandbox preview and relay the answer
pub async fn forward(
    client: &reqwest::Client,
    preview: &PreviewLink,
    prefix: &str,
    path: &str,
    req: Request<Body>,
) -> ServerResult<Response> {
    let url = target_url(&preview.url, path, req.uri().query());
    let method = req.method().clone();

    let mut headers = req.headers().clone();
    for name in &DROPPED_REQUEST_HEADERS {
        headers.remove(name);
    }
    if let Some(token) = &preview.token {
        let token = HeaderValue::from_str(token).map_err(|e| {
            ServerError::InternalError(format!("Preview token is not a valid header: {}", e))
        })?;
        headers.insert(PREVIEW_TOKEN_HEADER, token);
    }
    headers.insert(SKIP_PREVIEW_WARNING_HEADER, HeaderValue::from_static("true"));

    let body = body::to_bytes(req.into_body(), MAX_FORWARDED_BODY)
        .await
        .map_err(|e| {
            let e = e.into_inner();
            if e.is::<LengthLimitError>() {
                ServerError::PayloadTooLarge(format!(
                    "Request body exceeds {} bytes",
                    MAX_FORWARDED_BODY
                ))
            } else {
                ServerError::ValidationError(format!("Failed to read request body: {}", e))
            }
        })?;

    tracing::debug!("Forwarding {} {}", method, url);
    let upstream = client
        .request(method, &url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .map_err(|e| ServerError::ProxyError(e.to_string()))?;

    let status = upstream.status();
    let mut headers = clean_response_headers(upstream.headers());
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let body = if content_type.contains("text/html") || content_type.contains("text/css") {
        let text = upstream
            .text()
            .await
            .map_err(|e| ServerError::ProxyError(e.to_string()))?;
        headers.remove(CONTENT_ENCODING);

        let rewritten = if content_type.contains("text/html") {
            rewrite_html(&text, prefix)
        } else {
            rewrite_css(&text, prefix)
        };
        Body::from(rewritten)
    } else {
        Body::from_stream(upstream.bytes_stream())
    };

    Ok((status, headers, body).into_response())
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn clean_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = upstream.clone();
    for name in &DROPPED_RESPONSE_HEADERS {
        headers.remove(name);
    }

    // CORS is answered by our own layer
    let upstream_cors: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with("access-control-"))
        .cloned()
        .collect();
    for name in upstream_cors {
        headers.remove(name);
    }

    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
