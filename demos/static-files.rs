use webhatch::{HttpResponse, Outcome, Router, Server, ServerBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = current_src_dir_path();
    let index_dir = dir.clone();

    let router = Router::new("/").get("/", move |_req| {
        let body = index_page_html(&index_dir);
        Outcome::Response(HttpResponse::with_status(200, "OK").set_content_type("text/html; charset=utf-8").with_body(body.into_bytes()))
    });

    // `resources` serves every file under `dir` (conditional GET, ETag,
    // content negotiation and all) without listing it — `StaticFileHandler`
    // keeps its own RAM cache in the background.
    let router = router.resources("/", dir);

    let addr = ([0, 0, 0, 0], 8080).into();
    let config = ServerBuilder::new().handler(router).build()?;

    Server::bind(addr, config)?.run()?;

    Ok(())
}

/// Response body with a link to each file in this source directory.
fn index_page_html(dir: &std::path::Path) -> String {
    let mut body = "<html>\n<body>\n<h3>Static files example</h3>\n".to_string();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                if let Some(name) = entry.file_name().to_str() {
                    body += &format!("<a href=\"/{}\">{}</a> <br>\n", name, name);
                }
            }
        }
    }

    body += "</body>\n</html>\n";
    body
}

/// Directory path of this source file.
fn current_src_dir_path() -> std::path::PathBuf {
    let src_file_path = file!();
    let index_of_file = src_file_path.rfind('/').unwrap_or(0);
    std::path::PathBuf::from(&src_file_path[..index_of_file])
}
