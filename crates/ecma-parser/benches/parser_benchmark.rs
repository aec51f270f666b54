//! Parser throughput benchmarks over representative source shapes.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ecma_parser::{Parser, ParserConfig};

fn sample_source(functions: usize) -> String {
    let mut src = String::from("\"use strict\";\n");
    for i in 0..functions {
        src.push_str(&format!(
            "function handler{i}(req, {{ body = {{}}, ...rest }}) {{\n\
             \x20 const [first, ...tail] = req.items ?? [];\n\
             \x20 let total = 0;\n\
             \x20 for (const item of tail) {{ total += item?.price ?? 0; }}\n\
             \x20 return async () => `${{first}}:${{total}}` + JSON.stringify(rest);\n\
             }}\n"
        ));
    }
    src
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for &functions in &[10usize, 100] {
        let src = sample_source(functions);
        group.throughput(Throughput::Bytes(src.len() as u64));
        group.bench_function(format!("functions_{functions}"), |b| {
            b.iter(|| {
                let parser = Parser::new(black_box(&src), ParserConfig::default());
                let out = parser.parse_script().expect("benchmark source parses");
                black_box(out.root);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
