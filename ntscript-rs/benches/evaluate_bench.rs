use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ntscript::script::builtins::shared_registry;
use ntscript::script::{Parser, Script, Value, ValueMap};

const TEMPLATE: &str = "Dear #ucwords($name), your order #upper($order.id) of \
    #sum($order.qty, 2) items ships #if(#gr($order.qty,10),\"by freight\",\"by post\").";

fn make_text(repeats: usize) -> String {
    let chunk = "The quick brown fox jumps over the lazy dog. ";
    chunk.repeat(repeats)
}

fn context() -> Value {
    Value::from(
        ValueMap::new().with("name", "ada lovelace").with(
            "order",
            ValueMap::new().with("id", "ab-123").with("qty", 12),
        ),
    )
}

fn bench_evaluate(c: &mut Criterion) {
    let plain = make_text(1000); // ~45k, no markers
    let mut g = c.benchmark_group("evaluate");

    g.bench_function("tokenize_template", |b| b.iter(|| Parser::parse(black_box(TEMPLATE))));
    g.bench_function("tokenize_plain_med", |b| b.iter(|| Parser::parse(black_box(&plain))));

    let mut script = Script::new(shared_registry());
    script.set_context(context());
    g.bench_function("evaluate_template", |b| b.iter(|| script.evaluate(black_box(TEMPLATE))));

    let tree = Parser::parse(TEMPLATE).into_token();
    g.bench_function("evaluate_pretokenized", |b| {
        b.iter(|| tree.as_ref().map(|t| script.evaluate_token(black_box(t))))
    });

    let rows: Vec<Value> = (0..1000)
        .map(|i| Value::from(ValueMap::new().with("name", format!("user {i}")).with("order", ValueMap::new().with("qty", i))))
        .collect();
    g.bench_function("each_1000_records", |b| {
        b.iter(|| {
            let mut out = 0usize;
            if let Some(t) = &tree {
                script.set_objects(rows.clone()).each(|s| out += s.evaluate_token(t).to_string().len());
            }
            out
        })
    });

    g.finish();
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
