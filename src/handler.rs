//! Handler pipeline (§4.4): a `RequestHandler` either declines a request
//! (returning it unchanged, to be tried against the next handler) or answers
//! it (returning a response, short-circuiting the rest of the chain).

use crate::message::{HttpRequest, HttpResponse};

/// What a single handler did with the request it was given (§9 design
/// notes: "modeled as `enum Outcome`").
pub enum Outcome {
    /// Not handled; the coalescer passes `request` to the next handler.
    Request(HttpRequest),
    /// Handled; the coalescer stops and returns `response`.
    Response(HttpResponse),
}

pub trait RequestHandler: Send + Sync {
    fn apply(&self, request: HttpRequest) -> Outcome;
}

impl<F> RequestHandler for F
where
    F: Fn(HttpRequest) -> Outcome + Send + Sync,
{
    fn apply(&self, request: HttpRequest) -> Outcome {
        self(request)
    }
}

/// Folds `handlers` left-to-right over `request`: the first handler to
/// return `Response` short-circuits the rest. An empty chain returns the
/// request unchanged (§4.4).
pub fn coalesce(handlers: &[Box<dyn RequestHandler>], request: HttpRequest) -> Outcome {
    let mut current = request;
    for handler in handlers {
        match handler.apply(current) {
            Outcome::Response(response) => return Outcome::Response(response),
            Outcome::Request(next) => current = next,
        }
    }
    Outcome::Request(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::request::RequestLine;
    use crate::method::RequestMethod;
    use crate::version::HttpVersion;

    fn get(target: &str) -> HttpRequest {
        HttpRequest::new(RequestLine::new(RequestMethod::Get, target, HttpVersion::Http1_1))
    }

    #[test]
    fn empty_chain_returns_request_unchanged() {
        let outcome = coalesce(&[], get("/"));
        assert!(matches!(outcome, Outcome::Request(_)));
    }

    #[test]
    fn first_responder_short_circuits() {
        let never_runs: Box<dyn RequestHandler> = Box::new(|_req: HttpRequest| -> Outcome {
            panic!("should not run after a prior handler responded")
        });
        let responds: Box<dyn RequestHandler> = Box::new(|_req: HttpRequest| Outcome::Response(HttpResponse::with_status(200, "OK")));
        let declines: Box<dyn RequestHandler> = Box::new(|req: HttpRequest| Outcome::Request(req));

        let handlers: Vec<Box<dyn RequestHandler>> = vec![declines, responds, never_runs];
        match coalesce(&handlers, get("/")) {
            Outcome::Response(response) => assert_eq!(response.status_code(), 200),
            Outcome::Request(_) => panic!("expected a response"),
        }
    }
}
