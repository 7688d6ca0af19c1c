use std::thread::sleep;
use std::time::Duration;
use webhatch::{HttpResponse, Outcome, Router, Server, ServerBuilder};

/// Each request already runs on its own `service`-pool thread (§5), so a slow
/// handler like this one only blocks its own request — it never stalls other
/// clients the way it would behind a single event loop. `config.pool_size(n)`
/// bounds how many such requests can run at once; requests beyond that queue
/// until a thread frees up rather than spawning unbounded extra threads.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = ([0, 0, 0, 0], 8080).into();

    let router = Router::new("/")
        .get("/", |_req| html(INDEX_HTML))
        .get("/long", |_req| {
            sleep(Duration::from_secs(10));
            html("Complete")
        });

    let config = ServerBuilder::new()
        .handler(router)
        .handler(|_req| Outcome::Response(HttpResponse::with_status(404, "Not Found").set_content_type("text/plain; charset=utf-8").with_body(b"404".to_vec())))
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
        <h3>Long or blocking operations example</h3>
        <form action="long" method="get">
            <button>Make long operation on server</button>
        </form>
    </body>
</html>
"#;
