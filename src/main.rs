use std::sync::Arc;

use keel::config::Config;
use keel::http::request::Request;
use keel::http::response::{Response, ResponseBuilder, StatusCode};
use keel::router::Router;
use keel::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let router = Arc::new(routes()?);

    tokio::select! {
        res = server::listener::run(&cfg, router) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn routes() -> anyhow::Result<Router> {
    let router = Router::new()
        .route("/", |_: &Request| Response::ok("Hello from Keel\n"))?
        .route("/test", list_query)?
        .route("/echo", |req: &Request| {
            ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", "application/octet-stream")
                .body(req.body.clone())
                .build()
        })?;

    Ok(router)
}

fn list_query(req: &Request) -> Response {
    let mut body = String::from("<ul>");
    for (key, value) in req.query.iter() {
        body.push_str(&format!("<li>{key} = {value}</li>"));
    }
    body.push_str("</ul>");

    ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/html")
        .body(body)
        .build()
}
