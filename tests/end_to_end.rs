use tlc::bytecode::ClassUnit;
use tlc::runtime::{RuntimeError, Vm};
use tlc::{CompileError, CompilerConfig, compile, compile_with_config};

fn run(source: &str) -> Result<String, RuntimeError> {
    let compiled = compile(source).unwrap();
    let mut out = Vec::new();
    Vm::new().run(&compiled.class, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn output(body: &str) -> String {
    run(&format!("fn main -> do {} end", body)).unwrap()
}

fn compile_err(body: &str) -> CompileError {
    compile(&format!("fn main -> do {} end", body)).unwrap_err()
}

#[test]
fn test_add_and_print() {
    assert_eq!(output("1 2 + p"), "3\n");
}

#[test]
fn test_print_string() {
    assert_eq!(output("\"hi\" p"), "hi\n");
}

#[test]
fn test_unknown_identifier() {
    let err = compile_err("foo");
    assert!(matches!(err, CompileError::UnresolvedIdentifier { ref name } if name == "foo"));
    assert!(!err.is_type_error());
}

#[test]
fn test_loop_fixed_point() {
    // counts down from 3, printing each value
    let source = "fn main -> do 3 while dup 0 > do dup p 1 - end drop end";
    assert_eq!(run(source).unwrap(), "3\n2\n1\n");

    assert!(compile("fn main -> do 5 while dup 0 < do drop 0 end p end").is_ok());
    let err = compile_err("5 while dup 0 < do drop end");
    assert!(matches!(err, CompileError::ControlFlowJoin { .. }));
    assert!(err.is_type_error());
}

#[test]
fn test_if_merge() {
    assert!(matches!(
        compile_err("true if else 1 end"),
        CompileError::ControlFlowJoin { .. }
    ));
    assert_eq!(output("true if 1 else 2 end p"), "1\n");
    assert_eq!(output("false if 1 else 2 end p"), "2\n");
    assert_eq!(output("0 if \"yes\" p end"), "");
}

#[test]
fn test_comparisons() {
    assert_eq!(output("1 2 < p 2 1 < p"), "true\nfalse\n");
    assert_eq!(output("2 2 <= p 3 2 >= p 1 2 > p"), "true\ntrue\nfalse\n");
    assert_eq!(output("4 4 == p true false != p true ! p"), "true\ntrue\nfalse\n");
}

#[test]
fn test_arithmetic_and_bitwise() {
    assert_eq!(output("7 3 - p 6 7 * p 7 2 / p 7 2 % p"), "4\n42\n3\n1\n");
    assert_eq!(output("1 4 << p -16 2 >> p -1 28 >>> p"), "16\n-4\n15\n");
    assert_eq!(output("12 10 & p 12 10 | p 12 10 ^ p 0 ~ p"), "8\n14\n6\n-1\n");
    assert_eq!(output("41 ++ p 43 -- p"), "42\n42\n");
    assert_eq!(output("0x7FFF_FFFF ++ p"), "-2147483648\n");
}

#[test]
fn test_shuffles() {
    assert_eq!(output("1 2 swap p p"), "1\n2\n");
    assert_eq!(output("1 2 over p p p"), "1\n2\n1\n");
    assert_eq!(output("\"a\" dup p p"), "a\na\n");
    assert_eq!(output("1 2 drop p"), "1\n");
}

#[test]
fn test_arrays() {
    assert_eq!(output("[ 1 2 3 ] p"), "[1, 2, 3]\n");
    assert_eq!(output("[ true false ] p"), "[true, false]\n");
    assert_eq!(output("[ \"x\" \"y\" ] p"), "[x, y]\n");

    let config = CompilerConfig {
        trace: true,
        ..CompilerConfig::default()
    };
    let compiled = compile_with_config("fn main -> do [ 1 2 3 ] ?? drop end", &config).unwrap();
    assert!(compiled.trace.contains(&"?? [ [I ]".to_string()));

    assert!(matches!(compile_err("[ 1 true ]"), CompileError::Homogeneity { .. }));
    assert!(matches!(
        compile_err("[ ]"),
        CompileError::UnsupportedFeature { .. }
    ));
}

#[test]
fn test_inlines() {
    let source = "inline square dup * end\ninline show p end\nfn main -> do 7 square show end";
    assert_eq!(run(source).unwrap(), "49\n");

    let err = compile("inline loop loop end fn main -> do loop end").unwrap_err();
    assert!(matches!(err, CompileError::RecursiveInline { .. }));
}

#[test]
fn test_unsupported_features() {
    let err = compile_err("2 3 **");
    assert!(matches!(err, CompileError::UnsupportedFeature { .. }));
    assert!(!err.is_type_error());
}

#[test]
fn test_type_errors_name_the_rule() {
    let err = compile_err("\"a\" 1 +");
    assert_eq!(
        err.to_string(),
        "type error: `+` expects { I I -> I }, stack is [ *java/lang/String I ]"
    );
}

#[test]
fn test_grammar_error_location() {
    let err = compile("fn main -> do\n  1 2 + p\n").unwrap_err();
    match err {
        CompileError::Grammar(parse) => assert_eq!(parse.line, 3),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_runtime_division_by_zero() {
    let compiled = compile("fn main -> do 1 0 / p end").unwrap();
    let err = Vm::new().run(&compiled.class, &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("division by zero"));
}

#[test]
fn test_compilation_is_deterministic() {
    let source = "inline sq dup * end\nfn main -> do 3 while dup 0 > do dup sq p 1 - end drop [ 1 2 ] p end";
    let first = compile(source).unwrap().class.to_bytes().unwrap();
    let second = compile(source).unwrap().class.to_bytes().unwrap();
    assert_eq!(first, second);

    let decoded = ClassUnit::from_bytes(&first).unwrap();
    assert_eq!(decoded, compile(source).unwrap().class);
}
