use criterion::{black_box, criterion_group, criterion_main, Criterion};
use esscope_core::arena::AstArena;
use esscope_parser::Parser;
use esscope_traverse::{traverse, TraverseOptions};

/// A program with `count` functions, each declaring locals and closing over
/// the previous function.
fn generate_source(count: usize) -> String {
    let mut source = String::from("var total = 0;\n");
    for i in 0..count {
        source.push_str(&format!(
            "function step{i}(input) {{\n  var local = input * {i};\n  for (var j = 0; j < local; j++) {{\n    total = total + j;\n  }}\n  return function () {{ return local + total; }};\n}}\n"
        ));
        if i > 0 {
            source.push_str(&format!("step{i}(step{}(1)());\n", i - 1));
        }
    }
    source
}

fn bench_traverse(c: &mut Criterion) {
    let source = generate_source(200);
    let options = TraverseOptions::default();

    c.bench_function("parse_and_traverse", |b| {
        b.iter(|| {
            let arena = AstArena::new();
            let mut parser = Parser::new(&arena, "bench.js", black_box(&source));
            let program = parser.parse_program();
            let traversal = traverse(&options, program, |_, _| {});
            black_box(traversal.map(|t| t.scope_manager.scope_count()).ok());
        })
    });

    c.bench_function("traverse_only", |b| {
        let arena = AstArena::new();
        let mut parser = Parser::new(&arena, "bench.js", &source);
        let program = parser.parse_program();
        b.iter(|| {
            let mut visited = 0usize;
            let traversal = traverse(&options, black_box(program), |_, _| visited += 1);
            black_box((traversal.is_ok(), visited));
        })
    });
}

criterion_group!(benches, bench_traverse);
criterion_main!(benches);
