use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// Relative URL of the server's token-issuing flow.
///
/// The caller joins it onto the server base URL and opens it in a browser;
/// the server walks the user through authentication and hands back a token
/// to paste into the configuration.
pub fn auth_token_link(application_name: &str) -> String {
    let device = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown-host".into());
    format!(
        "authentication/token?applicationName={}&deviceId={}&deviceDescription=&permission=rw",
        utf8_percent_encode(application_name, NON_ALPHANUMERIC),
        utf8_percent_encode(&device, NON_ALPHANUMERIC),
    )
}
