use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use uni::syntax::{Lexer, Parser};
use uni::{Interpreter, Session};

const PROGRAM: &str = r#"
var total = 0
var words = {"one": 1, "two": 2, "three": 3}
fn fib(n) { if n < 2 { return n } return fib(n - 1) + fib(n - 2) }
for name, n in words { total = total + n * fib(10) }
var xs = []
var i = 0
while i < 20 { xs = [i, xs]; i = i + 1 }
"#;

fn bench_lexer(c: &mut Criterion) {
    let input = black_box(PROGRAM);
    c.bench_function("lexer", |b| {
        b.iter(|| {
            let tokens: Vec<_> = Lexer::new(input).collect::<Result<Vec<_>, _>>().unwrap();
            black_box(tokens);
        })
    });
}

fn bench_parser(c: &mut Criterion) {
    let input = black_box(PROGRAM);
    c.bench_function("parser", |b| {
        b.iter(|| {
            let program = Parser::from_source(input).parse_program().unwrap();
            black_box(program);
        })
    });
}

fn bench_interpreter(c: &mut Criterion) {
    let input = black_box(PROGRAM);
    c.bench_function("interpreter", |b| {
        b.iter(|| {
            let mut session = Session::with_interpreter(Interpreter::capturing());
            black_box(session.run(input).unwrap());
        })
    });
}

criterion_group!(benches, bench_lexer, bench_parser, bench_interpreter);
criterion_main!(benches);
