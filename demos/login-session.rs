use percent_encoding::percent_decode;
use rand::prelude::*;
use std::collections::hash_map::HashMap;
use std::sync::{Arc, Mutex};
use webhatch::cookie::{PlainCookie, SetCookie};
use webhatch::{HttpRequest, HttpResponse, Outcome, Router, Server, ServerBuilder};

const SESSION_ID_COOKIE_NAME: &str = "session_id";
struct User {}
type Users = Arc<Mutex<HashMap<String /* session id */, User>>>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let users: Users = Arc::new(Mutex::new(HashMap::new()));

    let logged_in = users.clone();
    let login_form = users.clone();
    let logout = users.clone();

    let router = Router::new("/")
        .get("/", move |request| {
            if is_logged(&session_id_from_request(&request), &logged_in) {
                html(200, LOGGED_USER_PAGE)
            } else {
                html(200, LOGIN_PAGE)
            }
        })
        .post("/login", move |request| response_to_login_form(request, &login_form))
        .get("/logout", move |request| {
            if let Some(session_id) = session_id_from_request(&request) {
                if let Ok(mut users) = logout.lock() {
                    users.remove(&session_id);
                }
            }
            let expired = SetCookie::new("session_id", "").unwrap().with_max_age(-1);
            let response = HttpResponse::with_status(303, "See Other").set_location("/").set_header("Set-Cookie", &expired.format());
            Outcome::Response(response)
        });

    let addr = ([0, 0, 0, 0], 8080).into();
    let config = ServerBuilder::new()
        .handler(router)
        .handler(|_req| Outcome::Response(HttpResponse::with_status(404, "Not Found").set_content_type("text/plain; charset=utf-8").with_body(b"404 page not found".to_vec())))
        .build()?;

    Server::bind(addr, config)?.run()?;

    Ok(())
}

fn html(status: u16, body: &str) -> Outcome {
    Outcome::Response(HttpResponse::with_status(status, "OK").set_content_type("text/html; charset=utf-8").with_body(body.as_bytes().to_vec()))
}

fn response_to_login_form(request: HttpRequest, users: &Users) -> Outcome {
    let body = match request.into_body_bytes() {
        Ok(body) => body,
        Err(_) => return html(400, "bad request body"),
    };
    let form = parse_form(&body);

    if form.get("login").map(String::as_str) == Some("admin") && form.get("password").map(String::as_str) == Some("admin") {
        let session_id = generate_session_id();
        if let Ok(mut users) = users.lock() {
            users.insert(session_id.clone(), User {});
        }

        let cookie = SetCookie::new(SESSION_ID_COOKIE_NAME, &session_id).unwrap().http_only();
        return Outcome::Response(HttpResponse::with_status(303, "See Other").set_location("/").set_header("Set-Cookie", &cookie.format()));
    }

    html(200, AUTHENTICATION_FAILED_PAGE)
}

fn session_id_from_request(request: &HttpRequest) -> Option<String> {
    request.header("Cookie").ok().map(PlainCookie::parse_header).and_then(|cookies| cookies.into_iter().find(|c| c.name == SESSION_ID_COOKIE_NAME)).map(|c| c.value)
}

fn is_logged(session_id: &Option<String>, users: &Users) -> bool {
    match (session_id, users.lock()) {
        (Some(session_id), Ok(users)) => users.contains_key(session_id),
        _ => false,
    }
}

/// Minimal `application/x-www-form-urlencoded` decoder; the library only
/// hands back the raw query string/body (§3), parsing is left to the caller.
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

fn generate_session_id() -> String {
    const LEN: usize = 48;
    let mut result = String::with_capacity(LEN);
    let mut rng = rand::thread_rng();
    for _ in 0..LEN {
        let ch = if rng.gen_range(0, 2) == 1 { rng.gen_range(b'A', b'Z' + 1) } else { rng.gen_range(b'a', b'z' + 1) };
        result.push(char::from(ch));
    }
    result
}

const LOGIN_PAGE: &str = r#"
<html>
    <body>
        <h3>Login-session example</h3>
        <form action="login" method="post">
            <input type="text" name="login" /> <br>
            <input type="password" name="password" /> <br>
            <button type="submit">Log In</button>
        </form>
    </body>
</html>
"#;

const AUTHENTICATION_FAILED_PAGE: &str = r#"
<html>
    <body>
        <b>Authentication failed.</b>
        <p>Hint: user is admin, password is admin.</p>
        <a href="/">
            <button type="submit">Try again</button>
        </a>
    </body>
</html>
"#;

const LOGGED_USER_PAGE: &str = r#"
<html>
    <body>
        <form action="logout">
            <button type="submit">Log out</button>
        </form>
    </body>
</html>
"#;
