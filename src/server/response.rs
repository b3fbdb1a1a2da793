//! Writing replies back through tiny_http.

use anyhow::Result;
use tiny_http::{Header, Method as HttpMethod, Request, Response, StatusCode};

use super::middleware::{Method, Reply, RequestInfo};

/// Extract what middleware needs from a tiny_http request.
pub fn request_info(request: &Request) -> RequestInfo {
    let method = match request.method() {
        HttpMethod::Get => Method::Get,
        HttpMethod::Head => Method::Head,
        _ => Method::Other,
    };
    let accept = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Accept"))
        .map(|h| h.value.to_string());
    RequestInfo::new(method, request.url(), accept)
}

/// Send `reply`. HEAD requests get the headers without the body.
pub fn respond(request: Request, reply: Reply, head: bool) -> Result<()> {
    let mut headers = vec![header("Content-Type", reply.content_type)?];
    for (name, value) in &reply.headers {
        headers.push(header(name, value)?);
    }

    let status = StatusCode(reply.status);
    if head {
        let mut response = Response::empty(status);
        for h in headers {
            response.add_header(h);
        }
        request.respond(response)?;
        return Ok(());
    }

    let mut response = Response::from_data(reply.body).with_status_code(status);
    for h in headers {
        response.add_header(h);
    }
    request.respond(response)?;
    Ok(())
}

/// 503 for requests arriving after close.
pub fn respond_unavailable(request: Request) -> Result<()> {
    let head = request.method() == &HttpMethod::Head;
    respond(request, Reply::unavailable(), head)
}

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow::anyhow!("invalid header {name}: {value}"))
}
