//! HTTP front door.
//!
//! Routes:
//! - `GET /healthz`
//! - `GET /search?q=|img=|url=&types=..&limit=&best=&raw=`

use crate::output;
use anyhow::{anyhow, Result};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use kgseed_core::{
    ImageSource, ResolveError, SchemaType, SeedEngine, SeedInput, SeedRequest, TypeSet,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use url::form_urlencoded;

pub async fn serve(engine: Arc<SeedEngine>, listen: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| anyhow!("serve: failed to bind {listen}: {e}"))?;
    let bound = listener
        .local_addr()
        .map_err(|e| anyhow!("serve: failed to read bound addr: {e}"))?;
    tracing::info!(addr = %bound, "listening");

    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| anyhow!("serve: accept failed: {e}"))?;
        let io = TokioIo::new(stream);
        let engine = engine.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, engine.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::warn!(peer = %peer, error = %e, "connection error");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    engine: Arc<SeedEngine>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    Ok(route(&engine, req.method(), req.uri().path(), req.uri().query()).await)
}

pub(crate) async fn route(
    engine: &SeedEngine,
    method: &Method,
    path: &str,
    query: Option<&str>,
) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::GET, "/healthz") => text_response(StatusCode::OK, "ok\n"),
        (&Method::GET, "/search") => {
            let request = match search_request(query) {
                Ok(request) => request,
                Err(msg) => return json_error(StatusCode::BAD_REQUEST, &msg),
            };
            match engine.resolve_seeds(request).await {
                Ok(response) => json_response(StatusCode::OK, &output::response_json(&response)),
                Err(ResolveError::InvalidInput(msg)) => json_error(StatusCode::BAD_REQUEST, &msg),
            }
        }
        _ => json_error(StatusCode::NOT_FOUND, "not found"),
    }
}

/// Build a request from `/search` parameters. `img` wins over `url`, which
/// wins over `q`.
pub(crate) fn search_request(query: Option<&str>) -> Result<SeedRequest, String> {
    let mut q = None;
    let mut img = None;
    let mut url = None;
    let mut types = TypeSet::new();
    let mut limit = None;
    let mut best_only = false;
    let mut raw = false;

    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "q" => q = Some(value.into_owned()),
            "img" => img = Some(value.into_owned()),
            "url" => url = Some(value.into_owned()),
            "types" => {
                types.extend(
                    value
                        .split(',')
                        .filter(|t| !t.trim().is_empty())
                        .map(SchemaType::new),
                );
            }
            "limit" => {
                let parsed = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| format!("invalid limit {value:?}"))?;
                limit = Some(parsed);
            }
            "best" => best_only = parse_flag("best", &value)?,
            "raw" => raw = parse_flag("raw", &value)?,
            _ => {}
        }
    }

    let input = match (img, url, q) {
        (Some(img), _, _) => SeedInput::Image(ImageSource::Remote(img)),
        (None, Some(url), _) => SeedInput::Url(url),
        (None, None, Some(q)) => SeedInput::Text(q),
        (None, None, None) => return Err("one of q, img or url is required".to_string()),
    };

    Ok(SeedRequest {
        input,
        types,
        limit,
        best_only,
        raw,
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("invalid {name} flag {value:?}")),
    }
}

fn text_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"internal error"))))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{\"error\":\"serialize\"}".to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{\"error\":\"internal\"}"))))
}

fn json_error(status: StatusCode, msg: &str) -> Response<Full<Bytes>> {
    json_response(status, &serde_json::json!({ "error": msg }))
}
