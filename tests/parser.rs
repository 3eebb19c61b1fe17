use pretty_assertions::assert_eq;
use uni::syntax::SyntaxErrorKind;
use uni::syntax::ast::{BinaryOp, Block, Expr, Stmt, UnaryOp};

mod common;
use crate::common::parse_from_source;

macro_rules! assert_parse {
    ($src:expr) => {{
        let result = parse_from_source($src).parse_program();
        assert!(result.is_ok(), "Expected no errors, got {:?}", result.as_ref().err());
        result.unwrap()
    }};
    ($src:expr, $kind:expr) => {{
        match parse_from_source($src).parse_program() {
            Ok(program) => panic!("Expected {:?}, got {program:?}", $kind),
            Err(err) => assert_eq!(err.kind, $kind, "unexpected error: {err}"),
        }
    }};
}

fn int(n: i64) -> Expr {
    Expr::Int(n)
}

#[test]
fn test_grouping_overrides_precedence() {
    let program = assert_parse!("(1 + 2) * 3");
    assert_eq!(
        program,
        vec![Stmt::Expr(Expr::binary(Expr::binary(int(1), BinaryOp::Add, int(2)), BinaryOp::Mul, int(3)))]
    );
}

#[test]
fn test_precedence_ladder() {
    // == is weakest, then or/and, then comparisons
    let program = assert_parse!("a == b or c < d + e * f");
    let expected = Expr::binary(
        Expr::ident("a"),
        BinaryOp::Eq,
        Expr::binary(
            Expr::ident("b"),
            BinaryOp::Or,
            Expr::binary(
                Expr::ident("c"),
                BinaryOp::Lt,
                Expr::binary(
                    Expr::ident("d"),
                    BinaryOp::Add,
                    Expr::binary(Expr::ident("e"), BinaryOp::Mul, Expr::ident("f")),
                ),
            ),
        ),
    );
    assert_eq!(program, vec![Stmt::Expr(expected)]);
}

#[test]
fn test_unary_operators() {
    let program = assert_parse!("!done; -x * 2");
    assert_eq!(
        program,
        vec![
            Stmt::Expr(Expr::unary(UnaryOp::Not, Expr::ident("done"))),
            Stmt::Expr(Expr::binary(Expr::unary(UnaryOp::Minus, Expr::ident("x")), BinaryOp::Mul, int(2))),
        ]
    );
}

#[test]
fn test_declaration_and_reassignment() {
    let program = assert_parse!("var x = 1\nx = x + 1;");
    assert_eq!(
        program,
        vec![
            Stmt::Var { name: "x".into(), value: int(1), is_new: true },
            Stmt::Var {
                name: "x".into(),
                value: Expr::binary(Expr::ident("x"), BinaryOp::Add, int(1)),
                is_new: false,
            },
        ]
    );
}

#[test]
fn test_index_assignment() {
    let program = assert_parse!(r#"grid[1][2] = "x""#);
    assert_eq!(
        program,
        vec![Stmt::SetIndex {
            subject: Expr::index(Expr::ident("grid"), int(1)),
            index: int(2),
            value: Expr::Str("x".into()),
        }]
    );
}

#[test]
fn test_else_if_chains() {
    let program = assert_parse!("if a { 1 } else if b { 2 } else { 3 }");
    let inner = Stmt::If {
        condition: Expr::ident("b"),
        consequence: Block::new(vec![Stmt::Expr(int(2))]),
        alternative: Some(Block::new(vec![Stmt::Expr(int(3))])),
    };
    assert_eq!(
        program,
        vec![Stmt::If {
            condition: Expr::ident("a"),
            consequence: Block::new(vec![Stmt::Expr(int(1))]),
            alternative: Some(Block::new(vec![inner])),
        }]
    );
}

#[test]
fn test_for_forms() {
    let program = assert_parse!("for k in m { } for i, v in [1, 2,] { println(i, v) }");
    match &program[..] {
        [Stmt::For { key, value: None, .. }, Stmt::For { key: i, value: Some(v), subject, .. }] => {
            assert_eq!(key, "k");
            assert_eq!((i.as_str(), v.as_str()), ("i", "v"));
            assert_eq!(subject, &Expr::Array(vec![int(1), int(2)]));
        }
        other => panic!("unexpected program {other:?}"),
    }
}

#[test]
fn test_function_declaration_and_call() {
    let program = assert_parse!("fn sum(a, b) { return a + b } sum(1, 2)");
    let Stmt::Function(decl) = &program[0] else { panic!("expected a function, got {:?}", program[0]) };
    assert_eq!(decl.name, "sum");
    assert_eq!(decl.params, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(program[1], Stmt::Expr(Expr::Call { callee: "sum".into(), args: vec![int(1), int(2)] }));
}

#[test]
fn test_collection_literals() {
    let program = assert_parse!(r#"var m = {"a": [1, 2.5], "b": {}}"#);
    let Stmt::Var { value: Expr::Map(entries), .. } = &program[0] else {
        panic!("expected a map, got {:?}", program[0])
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].1, Expr::Array(vec![int(1), Expr::Float(2.5)]));
    assert_eq!(entries[1].1, Expr::Map(vec![]));
}

#[test]
fn test_builtins_parse_as_expressions() {
    assert_parse!(r#"print("a", 1) println() len("abc") + 1"#);
}

#[test]
fn test_syntax_errors() {
    assert_parse!("var = 1", SyntaxErrorKind::ExpectedToken);
    assert_parse!("(1 + 2", SyntaxErrorKind::UnexpectedEof);
    assert_parse!("while x { println(x)", SyntaxErrorKind::UnexpectedEof);
    assert_parse!("if x println(x)", SyntaxErrorKind::ExpectedToken);
    assert_parse!("1 + * 2", SyntaxErrorKind::ExpectedExpression);
    assert_parse!("f(1) = 2", SyntaxErrorKind::InvalidAssignmentTarget);
    assert_parse!("var x = 99999999999999999999", SyntaxErrorKind::InvalidNumber);
    let overflowing = format!("var x = 1{}.0", "0".repeat(400));
    assert_parse!(&overflowing, SyntaxErrorKind::InvalidNumber);
    assert_parse!("var s = \"oops", SyntaxErrorKind::UnterminatedString);
}

#[test]
fn test_statements_before_an_error_are_still_yielded() {
    let results: Vec<_> = parse_from_source("var a = 1 var b = 2 )").collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok() && results[1].is_ok());
    assert_eq!(results[2].as_ref().unwrap_err().kind, SyntaxErrorKind::ExpectedExpression);
}

#[test]
fn test_display_round_trips() {
    let src = r#"
        var x = 1 + 2 * -3;
        x = (x - 1) / 2.0;
        return x == 4 and !false;
        var s = "line\n\"quoted\"";
        m["k"] = [1, {"a": 2}];
        ({"k": 1});
        fn f(a, b) { if a < b { return a } else { return b } }
        for k, v in m { println(k, v) }
        var tiny = 0.0000001;
        var huge = 100000000000000000000.0;
    "#;
    let program = assert_parse!(src);
    let printed: Vec<String> = program.iter().map(ToString::to_string).collect();
    assert_eq!(printed[0], "var x = (1 + (2 * (-3)));");
    // `and` binds tighter than `==`
    assert_eq!(printed[2], "return (x == (4 and (!false)));");
    assert_eq!(printed[8], "var tiny = 0.0000001;");
    assert_eq!(printed[9], "var huge = 100000000000000000000.0;");
    let reparsed = assert_parse!(&printed.join("\n"));
    assert_eq!(reparsed, program);
}

#[test]
fn test_deep_nesting_is_a_syntax_error() {
    let parens = format!("println({}1{})", "(".repeat(5000), ")".repeat(5000));
    assert_parse!(&parens, SyntaxErrorKind::NestingTooDeep);
    let negations = format!("var x = {}1", "-".repeat(50_000));
    assert_parse!(&negations, SyntaxErrorKind::NestingTooDeep);
    let blocks = format!("{}{}", "{".repeat(5000), "}".repeat(5000));
    assert_parse!(&blocks, SyntaxErrorKind::NestingTooDeep);
}

#[test]
fn test_nesting_below_the_limit_parses() {
    let src = format!("{}x", "- ".repeat(400));
    let program = assert_parse!(&src);
    let printed = program[0].to_string();
    assert_eq!(assert_parse!(&printed), program);
}
