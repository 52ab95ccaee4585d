use criterion::*;
use fundos_spider::scrape::parse_payment_fields;

fn read_fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("unable to read {path}: {err}"))
}

// parse a fund page into payment fields
// ----------------------------------------------------------
fn benchmark_parse(c: &mut Criterion) {
    let page = read_fixture("fundo_mxrf11.html");

    c.bench_function("parse fund page", |b| {
        b.iter(|| {
            let _fields = parse_payment_fields(black_box(&page)).unwrap();
        })
    });
}

// group sizes scale with the number of past distributions on the page
// ----------------------------------------------------------
fn benchmark_parse_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse distribution history");
    for rows in [1usize, 12, 120] {
        let mut page = String::from(r#"<html><body><strong class="value">9,62</strong>"#);
        for i in 0..rows {
            page.push_str(&format!(
                r#"<b class="sub-value fs-4 lh-3">{:02}/09/2026</b><b class="sub-value fs-4 lh-3">{:02}/10/2026</b><strong class="value d-inline-block fs-5 fw-900">0,{:02}</strong>"#,
                i % 28 + 1,
                i % 28 + 1,
                i % 100
            ));
        }
        page.push_str("</body></html>");

        group.bench_with_input(BenchmarkId::from_parameter(rows), &page, |b, page| {
            b.iter(|| parse_payment_fields(black_box(page)).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_parse_history);
criterion_main!(benches);
