//! Request path normalization.
//!
//! # Responsibilities
//! - Reduce the three CGI-style server values (script self path, request
//!   URI, path-info) to the canonical script path the client meant to hit
//! - Pick the route to dispatch from the `route` request parameter
//!
//! # Design Decisions
//! - Pure: no I/O, same inputs give the same output, never fails
//! - `..` cannot climb above the root; extra `..` segments are dropped
//! - Path-info is removed by its last literal occurrence in the self path

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// Raw request metadata as provided by the fronting web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerVars {
    /// Path of the executing script, including any path-info suffix.
    pub script_self: String,
    /// Full request URI, including query string.
    pub request_uri: String,
    /// Extra path segments after the script name.
    pub path_info: String,
}

impl ServerVars {
    pub fn new(
        script_self: impl Into<String>,
        request_uri: impl Into<String>,
        path_info: impl Into<String>,
    ) -> Self {
        Self {
            script_self: script_self.into(),
            request_uri: request_uri.into(),
            path_info: path_info.into(),
        }
    }
}

/// Canonical script path for a request.
///
/// ```
/// use route_resolver::routing::{clean_path_info, ServerVars};
///
/// let vars = ServerVars::new("", "//example.com/../app/index.php", "");
/// assert_eq!(clean_path_info(&vars), "/app/index.php");
/// ```
pub fn clean_path_info(vars: &ServerVars) -> String {
    let mut self_path: Cow<'_, str> = if vars.script_self.is_empty() {
        Cow::Owned(url_decode(&vars.request_uri))
    } else {
        Cow::Borrowed(vars.script_self.as_str())
    };

    if let Some(question) = self_path.find('?') {
        self_path = Cow::Owned(self_path[..question].to_string());
    }

    if !vars.path_info.is_empty() {
        if let Some(position) = self_path.rfind(vars.path_info.as_str()) {
            self_path = Cow::Owned(self_path[..position].to_string());
        }
    }

    let mut segments: Vec<&str> = Vec::new();
    for part in self_path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(part),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Decode like a form value: `+` is a space, then `%XX` escapes.
fn url_decode(input: &str) -> String {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Route selected by the `route` query or form parameter.
///
/// The query string wins over the form body. A missing or empty parameter
/// selects `fallback`.
pub fn current_route(query: &str, form: &str, fallback: &str) -> String {
    route_param(query)
        .or_else(|| route_param(form))
        .unwrap_or_else(|| fallback.to_string())
}

fn route_param(encoded: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded.as_bytes())
        .find(|(key, _)| key == "route")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
