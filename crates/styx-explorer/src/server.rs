//! HTTP routing onto the explorer operations.
//!
//! [`handle`] is a pure function from request parts to a [`Reply`], so routing can
//! be tested without a socket; [`run`] feeds it from a `tiny_http` server with a
//! fixed pool of worker threads sharing one [`Datastore`].

use std::io::Read;

use anyhow::{anyhow, Result};
use chrono::Local;
use log::{error, info, warn};
use percent_encoding::percent_decode_str;
use styx_data::explorer::{self, BrowseParams, Outcome};
use styx_data::{Datastore, Reference};
use tiny_http::{Header, Request, Response, Server};

use crate::config::Config;
use crate::html;

/// An HTTP response, independent of the server library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub location: Option<String>,
    pub body: String,
}

impl Reply {
    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            location: None,
            body,
        }
    }

    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            location: None,
            body: body.into(),
        }
    }

    fn redirect(location: String) -> Self {
        Self {
            status: 303,
            content_type: "text/plain; charset=utf-8",
            location: Some(location),
            body: String::new(),
        }
    }

    fn not_found() -> Self {
        Self::text(404, "Not Found\n")
    }
}

/// Decoded request parameters, from the query string and a form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Parse `application/x-www-form-urlencoded` text.
    pub fn parse(encoded: &str) -> Self {
        let pairs = form_urlencoded::parse(encoded.as_bytes())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        Params(pairs)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first value given for `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }
}

/// Route one request. `url` is the raw request target including any query;
/// `params` is the decoded form body. A form body replaces the query string, so a
/// form posted back to a URL that still carries an old query acts on its own fields.
pub fn handle(datastore: &Datastore, url: &str, params: Params) -> Reply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let params = if params.is_empty() {
        Params::parse(query)
    } else {
        params
    };

    match path {
        "/" | "/index.html" => return Reply::html(html::index_page()),
        "/time" => {
            return Reply::text(200, format!("{}\n", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f")))
        }
        _ => {}
    }

    let Some((route, rest)) = split_route(path) else {
        return Reply::not_found();
    };
    let reference = match Reference::from_path(&decode_path(rest)) {
        Ok(reference) => reference,
        Err(e) => {
            warn!("Bad reference {rest}: {e}");
            return Reply::text(400, format!("Invalid reference: {e}\n"));
        }
    };

    match dispatch(datastore, route, &reference, &params) {
        Ok(reply) => reply,
        Err(e) => {
            error!("{route} {reference} failed: {e:#}");
            Reply::text(500, "Internal Server Error\n")
        }
    }
}

fn dispatch(datastore: &Datastore, route: &str, reference: &Reference, params: &Params) -> Result<Reply> {
    let mut session = datastore.session()?;
    let reply = match route {
        "browse" => {
            let browse_params = BrowseParams {
                add_key: params.get("addKey"),
                add_val: params.get("addVal"),
                del_key: params.get("delKey"),
            };
            match explorer::browse(&mut session, reference, browse_params)? {
                Outcome::Page(page) => Reply::html(html::browse_page(&page)),
                Outcome::Redirect { location } => Reply::redirect(html::href("", &location)),
                Outcome::NotFound => Reply::not_found(),
            }
        }
        "view" => match explorer::view(&session, reference)? {
            Outcome::Page(page) => Reply::html(html::view_page(&page)),
            _ => Reply::not_found(),
        },
        "edit" => match explorer::edit(&mut session, reference, params.get("content"))? {
            Outcome::Page(page) => Reply::html(html::edit_page(&page)),
            _ => Reply::not_found(),
        },
        "content" => match explorer::content(&session, reference)? {
            Outcome::Page(text) => Reply::text(200, text),
            _ => Reply::not_found(),
        },
        _ => Reply::not_found(),
    };
    Ok(reply)
}

/// Split `/view/a/b` into `("view", "/a/b")`. `/view` alone addresses the root.
fn split_route(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.strip_prefix('/')?;
    let (route, rest) = match trimmed.find('/') {
        Some(slash) => (&trimmed[..slash], &trimmed[slash..]),
        None => (trimmed, "/"),
    };
    matches!(route, "browse" | "view" | "edit" | "content").then_some((route, rest))
}

/// Percent-decode a URL path. `+` stays literal; invalid UTF-8 is replaced.
fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// Serve until the process is stopped.
pub fn run(config: &Config) -> Result<()> {
    let datastore = Datastore::open(&config.datastore_url)?;
    let server = Server::http(("0.0.0.0", config.server_port))
        .map_err(|e| anyhow!("failed to listen on port {}: {e}", config.server_port))?;
    info!(
        "Starting (serverPort: {}, datastoreUrl: {}, workerThreads: {}).",
        config.server_port, config.datastore_url, config.worker_threads
    );
    std::thread::scope(|scope| {
        for _ in 0..config.worker_threads {
            scope.spawn(|| {
                for request in server.incoming_requests() {
                    serve(&datastore, request);
                }
            });
        }
    });
    info!("Stopping.");
    Ok(())
}

fn serve(datastore: &Datastore, mut request: Request) {
    let url = request.url().to_string();
    let mut params = Params::default();
    if is_form(&request) {
        let mut body = String::new();
        if let Err(e) = request.as_reader().read_to_string(&mut body) {
            warn!("Failed to read body of {url}: {e}");
        }
        params = Params::parse(&body);
    }

    let reply = handle(datastore, &url, params);
    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response.add_header(header);
    }
    if let Some(location) = reply.location {
        if let Ok(header) = Header::from_bytes(&b"Location"[..], location.as_bytes()) {
            response.add_header(header);
        }
    }
    if let Err(e) = request.respond(response) {
        warn!("Failed to respond to {url}: {e}");
    }
}

fn is_form(request: &Request) -> bool {
    request.headers().iter().any(|header| {
        header.field.equiv("Content-Type")
            && header
                .value
                .as_str()
                .starts_with("application/x-www-form-urlencoded")
    })
}
