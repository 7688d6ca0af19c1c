use webhatch::cookie::{PlainCookie, SetCookie};
use webhatch::{HttpResponse, Outcome, Server, ServerBuilder};

const COOKIE_NAME: &str = "test";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = ([0, 0, 0, 0], 8080).into();

    let config = ServerBuilder::new()
        .handler(|request| {
            let has_cookie = request
                .header("Cookie")
                .ok()
                .map(PlainCookie::parse_header)
                .map(|cookies| cookies.iter().any(|c| c.name == COOKIE_NAME))
                .unwrap_or(false);

            let response = if has_cookie {
                HttpResponse::with_status(200, "OK").set_content_type("text/html; charset=utf-8").with_body(HTML_WHEN_COOKIE_RECEIVED.as_bytes().to_vec())
            } else {
                let cookie = SetCookie::new(COOKIE_NAME, "abc").unwrap().http_only();
                HttpResponse::with_status(200, "OK")
                    .set_content_type("text/html; charset=utf-8")
                    .with_body(HTML_WHEN_NO_COOKIE.as_bytes().to_vec())
                    .set_header("Set-Cookie", &cookie.format())
            };

            Outcome::Response(response)
        })
        .build()?;

    Server::bind(addr, config)?.run()?;

    Ok(())
}

const HTML_WHEN_NO_COOKIE: &str = r#"
<html>
    <body>
        <h3>Cookie example</h3>
        <p>Set-Cookie request was sent, update this page!</p>
    </body>
</html>
"#;

const HTML_WHEN_COOKIE_RECEIVED: &str = r#"
<html>
    <body>
        <p>If you see this text then cookie was received on server.</p>
    </body>
</html>
"#;
