use percent_encoding::percent_decode;
use std::collections::HashMap;
use webhatch::{HttpResponse, Outcome, Router, Server, ServerBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = ([0, 0, 0, 0], 8080).into();

    let router = Router::new("/")
        .get("/", |_req| html(200, "OK", INDEX_HTML))
        .post("/form", |request| {
            let content_type = request.header("Content-Type").unwrap_or("");
            if !content_type.starts_with("application/x-www-form-urlencoded") {
                return text(422, "Unprocessable Entity", "wrong form");
            }

            let body = match request.into_body_bytes() {
                Ok(body) => body,
                Err(_) => return text(400, "Bad Request", "bad request body"),
            };

            let form = parse_form(&body);
            text(200, "OK", &format!("Form: {:?}", form))
        });

    let config = ServerBuilder::new()
        .handler(router)
        .handler(|_req| Outcome::Response(HttpResponse::with_status(404, "Not Found").set_content_type("text/plain; charset=utf-8").with_body(b"404 page not found".to_vec())))
        .build()?;

    Server::bind(addr, config)?.run()?;

    Ok(())
}

fn html(status: u16, reason: &str, body: &str) -> Outcome {
    Outcome::Response(HttpResponse::with_status(status, reason).set_content_type("text/html; charset=utf-8").with_body(body.as_bytes().to_vec()))
}

fn text(status: u16, reason: &str, body: &str) -> Outcome {
    Outcome::Response(HttpResponse::with_status(status, reason).set_content_type("text/plain; charset=utf-8").with_body(body.as_bytes().to_vec()))
}

/// Minimal `application/x-www-form-urlencoded` decoder; the library only
/// hands back the raw body (§3), parsing is left to the caller.
fn parse_form(body: &[u8]) -> HashMap<String, String> {
    let raw = String::from_utf8_lossy(body);
    let mut form = HashMap::new();
    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or("");
        let value = parts.next().unwrap_or("");
        let decode = |s: &str| percent_decode(s.replace('+', " ").as_bytes()).decode_utf8_lossy().into_owned();
        form.insert(decode(key), decode(value));
    }
    form
}

const INDEX_HTML: &str = r#"
<html>
    <body>
        <h3>Post form example</h3>
        <form action="form" method="post">
            <input type="text" name="first" />
            <br>
            <input type="text" name="second" />
            <br>
            <input type="submit" />
        </form>
    </body>
</html>
"#;
