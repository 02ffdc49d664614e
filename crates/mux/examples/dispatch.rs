use http::{Request, StatusCode};
use micro_mux::matcher::Matcher;
use micro_mux::{handler_fn, named_args, panic_recovery, Mux, ResponseWriter};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

// route predicates can come from configuration
const ADMIN_ROUTE: &str = r#"{ "type": "and", "matchers": [
    { "type": "methods", "methods": ["GET", "POST"] },
    { "type": "pattern", "pattern": "/admin/{{section}}", "start": "{{", "end": "}}" }
] }"#;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let admin: Matcher = serde_json::from_str(ADMIN_ROUTE).expect("admin route should be valid json");

    let mut mux = Mux::new();
    mux.handle("GET", "/users/:id", Arc::new(handler_fn(get_user)))
        .expect("users route should be valid")
        .handle("*", "/boom", Arc::new(handler_fn(boom)))
        .expect("boom route should be valid")
        .with(Arc::new(handler_fn(admin_section)), admin)
        .expect("admin route should be valid")
        .set_panic_handler(Arc::new(handler_fn(recovered)));

    for (method, path) in [("GET", "/users/42"), ("POST", "/admin/metrics"), ("PUT", "/boom"), ("GET", "/missing")] {
        let req = Request::builder().method(method).uri(path).body(()).expect("request should be valid");
        let response = mux.dispatch(req);
        info!(method, path, status = %response.status(), "dispatched");
    }
}

fn get_user(w: &mut ResponseWriter, r: &mut Request<()>) {
    let id = named_args(r).get("id").unwrap_or_default().to_owned();
    w.write(format!("user {id}\n"));
}

fn admin_section(w: &mut ResponseWriter, r: &mut Request<()>) {
    let section = named_args(r).get("section").unwrap_or_default().to_owned();
    w.write(format!("admin {section}\n"));
}

fn boom(_w: &mut ResponseWriter, _r: &mut Request<()>) {
    panic!("boom");
}

fn recovered(w: &mut ResponseWriter, r: &mut Request<()>) {
    let message = panic_recovery(r).and_then(|recovery| recovery.message()).unwrap_or_default();
    w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
    w.write(format!("recovered: {message}\n"));
}
