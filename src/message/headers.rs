//! Typed header accessors (§4.2). Each well-known header gets `has_*`,
//! `*`/`*_option`, `set_*`, and `*_removed` generated by the macros below and
//! mixed into `HttpRequest`/`HttpResponse` via `impl_common_headers!`.
//!
//! Scalar headers use `scalar_header!`; list-valued headers (`Accept`,
//! `Vary`, `Via`, `Warning`) use `list_header!`; `Set-Cookie`/`Cookie` get
//! their own hand-written accessors in `cookie::grammar` since their value
//! type isn't a bare string.

use crate::error::HeaderError;

/// Defines `has_name`, `name`, `name_option`, `set_name`, `name_removed` for
/// a single-valued header whose raw string form is returned as-is.
macro_rules! scalar_header {
    ($has:ident, $get:ident, $get_opt:ident, $set:ident, $removed:ident, $wire_name:expr) => {
        pub fn $has(&self) -> bool {
            self.headers().has($wire_name)
        }

        pub fn $get(&self) -> Result<&str, HeaderError> {
            self.headers().get($wire_name).ok_or(HeaderError::NotFound($wire_name))
        }

        pub fn $get_opt(&self) -> Option<&str> {
            self.headers().get($wire_name)
        }

        pub fn $set(&self, value: &str) -> Self {
            self.with_headers(self.headers().with_set($wire_name, value))
        }

        pub fn $removed(&self) -> Self {
            self.with_headers(self.headers().with_removed($wire_name))
        }
    };
}

/// Same shape but for headers that may occur multiple times (`Accept`,
/// `Via`, `Vary`, `Warning`, `Allow`): `*` returns the joined values.
macro_rules! list_header {
    ($has:ident, $get:ident, $all:ident, $add:ident, $set:ident, $removed:ident, $wire_name:expr) => {
        pub fn $has(&self) -> bool {
            self.headers().has($wire_name)
        }

        pub fn $all(&self) -> Vec<&str> {
            self.headers().get_all($wire_name).collect()
        }

        pub fn $get(&self) -> Result<String, HeaderError> {
            let values = self.$all();
            if values.is_empty() {
                return Err(HeaderError::NotFound($wire_name));
            }
            Ok(values.join(", "))
        }

        pub fn $add(&self, value: &str) -> Self {
            self.with_headers(self.headers().with_added($wire_name, value))
        }

        pub fn $set(&self, value: &str) -> Self {
            self.with_headers(self.headers().with_set($wire_name, value))
        }

        pub fn $removed(&self) -> Self {
            self.with_headers(self.headers().with_removed($wire_name))
        }
    };
}

/// Generates the accessor surface enumerated in §4.2, mixed into both
/// `HttpRequest` and `HttpResponse` since a message's wire position doesn't
/// change which headers are legal to read (only which are legal to send).
macro_rules! impl_common_headers {
    ($ty:ty) => {
        impl $ty {
            scalar_header!(has_content_length, content_length, content_length_option, set_content_length, content_length_removed, "Content-Length");
            scalar_header!(has_content_type, content_type, content_type_option, set_content_type, content_type_removed, "Content-Type");
            scalar_header!(has_content_encoding, content_encoding, content_encoding_option, set_content_encoding, content_encoding_removed, "Content-Encoding");
            scalar_header!(has_content_language, content_language, content_language_option, set_content_language, content_language_removed, "Content-Language");
            scalar_header!(has_content_location, content_location, content_location_option, set_content_location, content_location_removed, "Content-Location");
            scalar_header!(has_content_range, content_range, content_range_option, set_content_range, content_range_removed, "Content-Range");
            scalar_header!(has_content_disposition, content_disposition, content_disposition_option, set_content_disposition, content_disposition_removed, "Content-Disposition");
            scalar_header!(has_transfer_encoding, transfer_encoding, transfer_encoding_option, set_transfer_encoding, transfer_encoding_removed, "Transfer-Encoding");
            scalar_header!(has_connection, connection, connection_option, set_connection, connection_removed, "Connection");
            scalar_header!(has_keep_alive, keep_alive, keep_alive_option, set_keep_alive, keep_alive_removed, "Keep-Alive");
            scalar_header!(has_upgrade, upgrade, upgrade_option, set_upgrade, upgrade_removed, "Upgrade");
            scalar_header!(has_host, host, host_option, set_host, host_removed, "Host");
            scalar_header!(has_user_agent, user_agent, user_agent_option, set_user_agent, user_agent_removed, "User-Agent");
            scalar_header!(has_server, server, server_option, set_server, server_removed, "Server");
            scalar_header!(has_date, date, date_option, set_date, date_removed, "Date");
            scalar_header!(has_expires, expires, expires_option, set_expires, expires_removed, "Expires");
            scalar_header!(has_last_modified, last_modified, last_modified_option, set_last_modified, last_modified_removed, "Last-Modified");
            scalar_header!(has_if_modified_since, if_modified_since, if_modified_since_option, set_if_modified_since, if_modified_since_removed, "If-Modified-Since");
            scalar_header!(has_if_unmodified_since, if_unmodified_since, if_unmodified_since_option, set_if_unmodified_since, if_unmodified_since_removed, "If-Unmodified-Since");
            scalar_header!(has_if_match, if_match, if_match_option, set_if_match, if_match_removed, "If-Match");
            scalar_header!(has_if_none_match, if_none_match, if_none_match_option, set_if_none_match, if_none_match_removed, "If-None-Match");
            scalar_header!(has_etag, etag, etag_option, set_etag, etag_removed, "ETag");
            scalar_header!(has_location, location, location_option, set_location, location_removed, "Location");
            scalar_header!(has_retry_after, retry_after, retry_after_option, set_retry_after, retry_after_removed, "Retry-After");
            scalar_header!(has_age, age, age_option, set_age, age_removed, "Age");
            scalar_header!(has_expect, expect, expect_option, set_expect, expect_removed, "Expect");
            scalar_header!(has_accept_ranges, accept_ranges, accept_ranges_option, set_accept_ranges, accept_ranges_removed, "Accept-Ranges");
            scalar_header!(has_cache_control, cache_control, cache_control_option, set_cache_control, cache_control_removed, "Cache-Control");

            list_header!(has_accept, accept, accept_all, add_accept, set_accept, accept_removed, "Accept");
            list_header!(has_accept_charset, accept_charset, accept_charset_all, add_accept_charset, set_accept_charset, accept_charset_removed, "Accept-Charset");
            list_header!(has_accept_encoding, accept_encoding, accept_encoding_all, add_accept_encoding, set_accept_encoding, accept_encoding_removed, "Accept-Encoding");
            list_header!(has_accept_language, accept_language, accept_language_all, add_accept_language, set_accept_language, accept_language_removed, "Accept-Language");
            list_header!(has_allow, allow, allow_all, add_allow, set_allow, allow_removed, "Allow");
            list_header!(has_vary, vary, vary_all, add_vary, set_vary, vary_removed, "Vary");
            list_header!(has_via, via, via_all, add_via, set_via, via_removed, "Via");
            list_header!(has_warning, warning, warning_all, add_warning, set_warning, warning_removed, "Warning");
        }
    };
}

pub(crate) use impl_common_headers;
pub(crate) use list_header;
pub(crate) use scalar_header;

#[cfg(test)]
mod tests {
    use crate::message::response::HttpResponse;

    #[test]
    fn scalar_accessor_roundtrip() {
        let response = HttpResponse::with_status(200, "OK").set_content_type("text/plain");
        assert!(response.has_content_type());
        assert_eq!(response.content_type().unwrap(), "text/plain");
        assert_eq!(response.content_type_removed().content_type_option(), None);
    }

    #[test]
    fn list_accessor_accumulates_and_joins() {
        let response = HttpResponse::with_status(200, "OK").add_vary("Accept-Encoding").add_vary("Cookie");
        assert_eq!(response.vary_all(), vec!["Accept-Encoding", "Cookie"]);
        assert_eq!(response.vary().unwrap(), "Accept-Encoding, Cookie");
    }
}
