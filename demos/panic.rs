use webhatch::error::ResponseAborted;
use webhatch::{HttpResponse, Outcome, Router, Server, ServerBuilder};

/// A handler panic is caught at the connection boundary (§7): a plain panic
/// routes through `config.error_handler` as `HandlerError::Other` and answers
/// with a response, while panicking with `ResponseAborted` (or
/// `HandlerError::Aborted`) kills the connection without writing anything.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = ([0, 0, 0, 0], 8080).into();

    let router = Router::new("/")
        .get("/", |_req| html(INDEX_HTML))
        .get("/panic", |_req| panic!("panic test"))
        .get("/abort", |_req| std::panic::resume_unwind(Box::new(ResponseAborted)));

    let config = ServerBuilder::new()
        .handler(router)
        .handler(|_req| Outcome::Response(HttpResponse::with_status(404, "Not Found").set_content_type("text/plain; charset=utf-8").with_body(b"404 page not found".to_vec())))
        .error_handler(|error, _request| {
            HttpResponse::with_status(500, "Internal Server Error")
                .set_content_type("text/plain; charset=utf-8")
                .with_body(format!("handler panicked: {}", error).into_bytes())
        })
        .build()?;

    Server::bind(addr, config)?.run()?;

    Ok(())
}

fn html(body: &str) -> Outcome {
    Outcome::Response(HttpResponse::with_status(200, "OK").set_content_type("text/html; charset=utf-8").with_body(body.as_bytes().to_vec()))
}

const INDEX_HTML: &str = r#"
<html>
    <body>
        <h3>Panic example</h3>
        <form action="panic" method="get">
            <button>Make panic on server (answered with a 500)</button>
        </form>
        <form action="abort" method="get">
            <button>Abort the response (connection closes, nothing is written)</button>
        </form>
    </body>
</html>
"#;
