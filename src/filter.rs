//! Response filter chain (§4.4): each filter sees the response produced so
//! far (plus the originating request, stashed as the `response.request`
//! attribute by the connection service) and returns a transformed response.

use crate::message::HttpResponse;

pub trait ResponseFilter: Send + Sync {
    fn apply(&self, response: HttpResponse) -> HttpResponse;
}

impl<F> ResponseFilter for F
where
    F: Fn(HttpResponse) -> HttpResponse + Send + Sync,
{
    fn apply(&self, response: HttpResponse) -> HttpResponse {
        self(response)
    }
}

/// Folds `filters` left-to-right over `response`. An empty chain returns
/// `response` unchanged (§4.4).
pub fn chain(filters: &[Box<dyn ResponseFilter>], response: HttpResponse) -> HttpResponse {
    filters.iter().fold(response, |response, filter| filter.apply(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chain_is_identity() {
        let response = HttpResponse::with_status(200, "OK");
        let filtered = chain(&[], response.clone());
        assert_eq!(filtered.status_code(), response.status_code());
    }

    #[test]
    fn filters_compose_left_to_right() {
        let add_server: Box<dyn ResponseFilter> = Box::new(|r: HttpResponse| r.set_server("webhatch"));
        let add_vary: Box<dyn ResponseFilter> = Box::new(|r: HttpResponse| r.add_vary("Accept-Encoding"));

        let response = chain(&[add_server, add_vary], HttpResponse::with_status(200, "OK"));
        assert_eq!(response.server().unwrap(), "webhatch");
        assert_eq!(response.vary_all(), vec!["Accept-Encoding"]);
    }
}
