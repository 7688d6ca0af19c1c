use webhatch::{HttpResponse, Outcome, Router, Server, ServerBuilder};

fn html(body: &str) -> Outcome {
    Outcome::Response(HttpResponse::with_status(200, "OK").set_content_type("text/html; charset=utf-8").with_body(body.as_bytes().to_vec()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = ([0, 0, 0, 0], 8080).into();

    let router = Router::new("/")
        .get("/", |_req| html(FIRST_PAGE_HTML))
        .get("/second_page", |_req| html(SECOND_PAGE_HTML))
        .get("/third_page", |_req| html(THIRD_PAGE_HTML));

    let config = ServerBuilder::new()
        .handler(router)
        .handler(|_req| Outcome::Response(HttpResponse::with_status(404, "Not Found").set_content_type("text/plain; charset=utf-8").with_body(b"404 page not found".to_vec())))
        .build()?;

    Server::bind(addr, config)?.run()?;

    Ok(())
}

const FIRST_PAGE_HTML: &str = r#"
<html>
    <body>
        <h3>Route example</h3>
        <h4>First page</h4>
        <a href="/second_page">second page</a> <br>
        <a href="/third_page">third page</a>
    </body>
</html>
"#;

const SECOND_PAGE_HTML: &str = r#"
<html>
    <body>
        <h4>Second page</h4>
        <a href="/">first page</a> <br>
        <a href="/third_page">third page</a>
    </body>
</html>
"#;

const THIRD_PAGE_HTML: &str = r#"
<html>
    <body>
        <h4>Third page</h4>
        <a href="/">first page</a> <br>
        <a href="/second_page">second page</a>
    </body>
</html>
"#;
