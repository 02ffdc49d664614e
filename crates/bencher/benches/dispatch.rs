use std::hint::black_box;
use std::sync::Arc;
use bencher::{RouteTable, TestCase};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use http::Request;
use micro_mux::matcher::{Matcher, MuxMatcher};
use micro_mux::{handler_fn, Handler, Mux, ResponseWriter, SharedHandler};

static SMALL_TABLE: RouteTable = RouteTable::new(&[("GET", "/"), ("GET", "/users/:id"), ("POST", "/users")], "/users/42");

static NORMAL_TABLE: RouteTable = RouteTable::new(
    &[
        ("GET", "/"),
        ("GET", "/users"),
        ("POST", "/users"),
        ("GET", "/users/:id"),
        ("PUT", "/users/:id"),
        ("DELETE", "/users/:id"),
        ("GET", "/users/:id/orders"),
        ("GET", "/users/:id/orders/:order"),
        ("GET", "/products"),
        ("GET", "/products/:sku"),
        ("*", "/health"),
        ("*", "/static/:path"),
    ],
    "/users/42/orders/7",
);

static LARGE_TABLE: RouteTable = RouteTable::new(
    &[
        ("GET", "/"),
        ("GET", "/users"),
        ("POST", "/users"),
        ("GET", "/users/:id"),
        ("PUT", "/users/:id"),
        ("PATCH", "/users/:id"),
        ("DELETE", "/users/:id"),
        ("GET", "/users/:id/orders"),
        ("POST", "/users/:id/orders"),
        ("GET", "/users/:id/orders/:order"),
        ("DELETE", "/users/:id/orders/:order"),
        ("GET", "/users/:id/orders/:order/items"),
        ("GET", "/users/:id/orders/:order/items/:item"),
        ("GET", "/products"),
        ("POST", "/products"),
        ("GET", "/products/:sku"),
        ("PUT", "/products/:sku"),
        ("GET", "/products/:sku/reviews"),
        ("GET", "/products/:sku/reviews/:review"),
        ("GET", "/carts/:cart"),
        ("POST", "/carts/:cart/items"),
        ("DELETE", "/carts/:cart/items/:item"),
        ("GET", "/search"),
        ("*", "/health"),
        ("*", "/metrics"),
        ("*", "/static/:path"),
    ],
    "/static/css/site.css",
);

fn create_test_cases() -> Vec<TestCase> {
    vec![
        TestCase::small("param", SMALL_TABLE),
        TestCase::normal("nested_params", NORMAL_TABLE),
        TestCase::large("wildcard_tail", LARGE_TABLE),
    ]
}

fn build_mux(table: &RouteTable) -> Mux<()> {
    let ok: SharedHandler<()> = Arc::new(handler_fn(|w: &mut ResponseWriter, _: &mut Request<()>| w.write("OK")));

    let mut mux = Mux::new();
    for (method, pattern) in table.routes() {
        mux.handle(method, pattern, Arc::clone(&ok)).expect("route table should be valid");
    }
    mux
}

fn benchmark_dispatch(criterion: &mut Criterion) {
    let test_cases = create_test_cases();
    let mut group = criterion.benchmark_group("dispatch");

    for case in test_cases {
        let mux = build_mux(case.table());
        group.bench_with_input(BenchmarkId::new(case.group().as_str(), case.name()), &case, |b, case| {
            b.iter_batched_ref(
                || Request::get(case.table().path()).body(()).expect("path should be a valid uri"),
                |req| {
                    let mut writer = ResponseWriter::new();
                    mux.serve(&mut writer, req);
                    black_box(writer);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_matcher_test(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("matcher_test");

    for (name, pattern, start, end) in [
        ("colon_start", "/:args1/:args2/:args3", ":", "/"),
        ("colon_both", "/:args1:/:args2:/:args3:", ":", ":"),
        ("double_curly_braces", "/{{args1}}/{{args2}}/{{args3}}", "{{", "}}"),
    ] {
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter_batched(
                || Matcher::pattern(0.0, pattern, start, end, false),
                |mut matcher| {
                    black_box(matcher.test());
                    black_box(matcher)
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(dispatch, benchmark_dispatch, benchmark_matcher_test);
criterion_main!(dispatch);
