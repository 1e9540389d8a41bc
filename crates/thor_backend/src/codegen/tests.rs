use thor_frontend::ast::Program;
use thor_frontend::{ResolvedModule, ResolvedProgram};

use super::{generate, CUnit, CodegenError};
use crate::runtime::Helper;

fn parse(source: &str) -> Program {
    let (tokens, lex_errors) = thor_frontend::lex(source);
    assert!(lex_errors.is_empty(), "lex errors: {lex_errors:?}");

    let (program, parse_errors) = thor_frontend::parse(tokens);
    assert!(parse_errors.is_empty(), "parse errors: {parse_errors:?}");

    program
}

/// Builds a merged program the way the import resolver would: named
/// modules first, the main program last.
fn resolved(modules: &[(&str, &str)], main: &str) -> ResolvedProgram {
    let mut merged: Vec<ResolvedModule> = modules
        .iter()
        .map(|&(name, source)| {
            let program = parse(source);
            ResolvedModule {
                name: Some(name.to_owned()),
                package: program.package,
                statements: program.statements,
                builtin: false,
            }
        })
        .collect();

    let main = parse(main);
    merged.push(ResolvedModule {
        name: None,
        package: main.package,
        statements: main.statements,
        builtin: false,
    });

    ResolvedProgram {
        modules: merged,
        warnings: vec![],
    }
}

fn gen(main: &str) -> CUnit {
    generate(&resolved(&[], main)).unwrap()
}

#[test]
fn hello_world() {
    let unit = gen("int main() { println(\"hello\"); return 0; }");

    assert!(unit.source.contains("thor_println(\"hello\");"));
    assert!(unit.source.contains("static void thor_println"));
    assert_eq!(
        unit.helpers.into_iter().collect::<Vec<_>>(),
        vec![Helper::Println]
    );
}

#[test]
fn unused_helpers_are_absent() {
    let unit = gen("int main() { return 1 + 2; }");

    assert!(unit.helpers.is_empty());
    assert!(!unit.source.contains("thor_"));
}

#[test]
fn fixed_preamble() {
    let unit = gen("int main() { return 0; }");
    assert!(unit.source.starts_with("#include <stdio.h>\n"));
}

#[test]
fn type_lowering() {
    let unit = gen(
        "string greet(bool loud, float x, int[] xs) { return \"\"; }\n\
         int main() { return 0; }",
    );

    assert!(unit.source.contains("char* greet(int loud, float x, int* xs)"));
}

#[test]
fn ref_param_lowering() {
    let unit = gen(
        "void bump(ref int x) { x = x + 1; }\n\
         int main() { int n = 0; bump(n); return n; }",
    );

    // Pointer in the signature, deref at every use, address-of at the
    // call site.
    assert!(unit.source.contains("void bump(int* x)"));
    assert!(unit.source.contains("(*x) = ((*x) + 1);"));
    assert!(unit.source.contains("bump(&n);"));
}

#[test]
fn ref_param_forwards_without_address_of() {
    let unit = gen(
        "void inner(ref int x) { x = 1; }\n\
         void outer(ref int x) { inner(x); }\n\
         int main() { return 0; }",
    );

    assert!(unit.source.contains("inner(x);"));
    assert!(!unit.source.contains("inner(&x);"));
}

#[test]
fn format_string_lowering() {
    let unit = gen(
        "int main() {\n\
             string s = \"a\";\n\
             int n = 5;\n\
             println(\"%s and %s\" % [s, n]);\n\
             return 0;\n\
         }",
    );

    assert!(unit
        .source
        .contains("thor_println(thor_format(\"%s and %ld\", s, (long)(n)));"));
    assert!(unit.helpers.contains(&Helper::Format));
}

#[test]
fn format_float_widens_to_double() {
    let unit = gen("int main() { float x = 1.5; println(\"%s\" % [x]); return 0; }");
    assert!(unit
        .source
        .contains("thor_format(\"%f\", (double)(x))"));
}

#[test]
fn stray_percent_is_doubled() {
    let unit = gen("int main() { println(\"100% of %s\" % [1]); return 0; }");
    assert!(unit.source.contains("thor_format(\"100%% of %ld\""));
}

#[test]
fn format_arity_mismatch() {
    let error = generate(&resolved(
        &[],
        "int main() { println(\"%s %s\" % [1]); return 0; }",
    ))
    .unwrap_err();

    assert!(matches!(
        error,
        CodegenError::FormatArityMismatch {
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn format_arg_of_unknown_type() {
    let error = generate(&resolved(
        &[],
        "int main() { println(\"%s\" % [mystery()]); return 0; }",
    ))
    .unwrap_err();

    assert!(matches!(error, CodegenError::UnknownType { .. }));
}

#[test]
fn string_equality_compares_content() {
    let unit = gen(
        "int main() {\n\
             string a = \"x\";\n\
             string b = \"y\";\n\
             if (a == b) return 1;\n\
             if (a != b) return 2;\n\
             return 0;\n\
         }",
    );

    assert!(unit.source.contains("if (thor_str_eq(a, b))"));
    assert!(unit.source.contains("if (!thor_str_eq(a, b))"));
    assert!(unit.helpers.contains(&Helper::StrEq));
}

#[test]
fn int_equality_stays_direct() {
    let unit = gen("int main() { int a = 1; if (a == 1) return 1; return 0; }");

    assert!(unit.source.contains("(a == 1)"));
    assert!(!unit.helpers.contains(&Helper::StrEq));
}

#[test]
fn module_functions_are_prefixed() {
    let unit = generate(&resolved(
        &[
            ("vec", "int add(int a, int b) { return a + b; }"),
            ("mat", "int add(int a, int b) { return a * b; }"),
        ],
        "int main() { return vec::add(1, 2) + mat::add(3, 4); }",
    ))
    .unwrap();

    assert!(unit.source.contains("int vec_add(int a, int b)"));
    assert!(unit.source.contains("int mat_add(int a, int b)"));
    assert!(unit.source.contains("vec_add(1, 2)"));
    assert!(unit.source.contains("mat_add(3, 4)"));
}

#[test]
fn package_name_wins_over_import_name() {
    let unit = generate(&resolved(
        &[("vec", "package math.vec;\nint len() { return 0; }")],
        "int main() { return len(); }",
    ))
    .unwrap();

    assert!(unit.source.contains("int math_vec_len(void)"));
    // A unique export resolves without qualification.
    assert!(unit.source.contains("return math_vec_len();"));
}

#[test]
fn own_module_call_beats_other_modules() {
    let unit = generate(&resolved(
        &[("util", "int helper() { return 1; }\nint run() { return helper(); }")],
        "int helper() { return 2; }\nint main() { return helper(); }",
    ))
    .unwrap();

    // Inside `util`, `helper` is its own; in main, main's.
    assert!(unit.source.contains("return util_helper();"));
    assert!(unit.source.contains("return helper();"));
}

#[test]
fn forward_declarations_precede_definitions() {
    let unit = generate(&resolved(
        &[],
        "int ping(int n) { if (n == 0) return 0; return pong(n - 1); }\n\
         int pong(int n) { return ping(n); }\n\
         int main() { return ping(3); }",
    ))
    .unwrap();

    let decl = unit.source.find("int pong(int n);").unwrap();
    let def = unit.source.find("int pong(int n) {").unwrap();
    assert!(decl < def);

    // Mutual recursion resolves because every prototype comes first.
    let ping_decl = unit.source.find("int ping(int n);").unwrap();
    let ping_def = unit.source.find("int ping(int n) {").unwrap();
    assert!(ping_decl < ping_def);
}

#[test]
fn extern_declarations_pass_through() {
    let unit = gen(
        "extern int puts(string s);\n\
         int main() { puts(\"hi\"); return 0; }",
    );

    assert!(unit.source.contains("extern int puts(char* s);"));
    assert!(unit.source.contains("puts(\"hi\");"));
}

#[test]
fn globals_are_visible_to_functions() {
    let unit = gen(
        "int counter = 0;\n\
         const int LIMIT = 10;\n\
         int main() { counter = counter + 1; return counter < LIMIT; }",
    );

    assert!(unit.source.contains("int counter = 0;"));
    assert!(unit.source.contains("const int LIMIT = 10;"));

    // Globals come before any function body.
    let global = unit.source.find("int counter = 0;").unwrap();
    let body = unit.source.find("int main(void) {").unwrap();
    assert!(global < body);
}

#[test]
fn array_initializer() {
    let unit = gen("int main() { int[] xs = [1, 2, 3]; return 0; }");
    assert!(unit.source.contains("int xs[] = {1, 2, 3};"));
}

#[test]
fn input_builtin_takes_a_prompt() {
    let unit = gen("int main() { string line = input(\"Enter name: \"); return 0; }");

    assert!(unit
        .source
        .contains("char* line = thor_input(\"Enter name: \");"));
    assert!(unit.helpers.contains(&Helper::Input));
}

#[test]
fn input_without_a_prompt_is_an_arity_error() {
    let error = generate(&resolved(&[], "int main() { string s = input(); return 0; }"))
        .unwrap_err();
    assert!(matches!(
        error,
        CodegenError::BuiltinArity {
            builtin: "input",
            expected: 1,
            found: 0,
            ..
        }
    ));
}

#[test]
fn builtin_arity_is_checked() {
    let error = generate(&resolved(&[], "int main() { println(); return 0; }")).unwrap_err();
    assert!(matches!(
        error,
        CodegenError::BuiltinArity {
            builtin: "println",
            ..
        }
    ));
}

#[test]
fn println_of_a_number_formats_it() {
    let unit = gen("int main() { println(42); return 0; }");
    assert!(unit
        .source
        .contains("thor_println(thor_format(\"%ld\", (long)(42)));"));
}

#[test]
fn statement_assignments_are_unparenthesized() {
    let unit = gen(
        "int main() {\n\
             int x = 0;\n\
             int y = 0;\n\
             x = x + 1;\n\
             x = y = 3;\n\
             return x;\n\
         }",
    );

    assert!(unit.source.contains("x = (x + 1);"));
    // Only the outermost assignment sheds its parentheses.
    assert!(unit.source.contains("x = (y = 3);"));
}

#[test]
fn branches_are_brace_balanced() {
    let unit = gen(
        "int main() {\n\
             int x = 0;\n\
             if (x == 0) x = 1; else { x = 2; }\n\
             while (x > 0) x = x - 1;\n\
             return x;\n\
         }",
    );

    let opens = unit.source.matches('{').count();
    let closes = unit.source.matches('}').count();
    assert_eq!(opens, closes);

    assert!(unit.source.contains("if ((x == 0)) {"));
    assert!(unit.source.contains("} else {"));
    assert!(unit.source.contains("while ((x > 0)) {"));
}

#[test]
fn member_access_is_unsupported() {
    let error = generate(&resolved(&[], "int main() { int y = p.x; return 0; }")).unwrap_err();
    assert!(matches!(
        error,
        CodegenError::Unsupported {
            construct: "member access",
            line: 1,
        }
    ));
}

#[test]
fn chained_calls_are_unsupported() {
    let error = generate(&resolved(&[], "int main() { f(1)(2); return 0; }")).unwrap_err();
    assert!(matches!(
        error,
        CodegenError::Unsupported {
            construct: "a computed call target",
            ..
        }
    ));
}

#[test]
fn array_literal_argument_becomes_a_compound_literal() {
    let unit = gen(
        "int first(int xs[]) { return 0; }\n\
         int main() { return first([1, 2]); }",
    );
    assert!(unit.source.contains("first((int[]){1, 2})"));
}

#[test]
fn empty_array_literal_in_expression_position_is_unsupported() {
    let error = generate(&resolved(&[], "int main() { take([]); return 0; }")).unwrap_err();
    assert!(matches!(
        error,
        CodegenError::Unsupported {
            construct: "an array literal with no inferable element type",
            ..
        }
    ));
}

#[test]
fn reference_argument_must_be_a_variable() {
    let error = generate(&resolved(
        &[],
        "void bump(ref int x) { x = x + 1; }\n\
         int main() { bump(1); return 0; }",
    ))
    .unwrap_err();
    assert!(matches!(
        error,
        CodegenError::Unsupported {
            construct: "a non-variable reference argument",
            ..
        }
    ));
}

#[test]
fn statement_outside_function_is_an_invariant_violation() {
    let error = generate(&resolved(&[], "1 + 2;")).unwrap_err();
    assert!(matches!(error, CodegenError::InternalInvariant { .. }));
}

#[test]
fn builtin_module_declarations_are_not_emitted() {
    let mut program = resolved(&[], "int main() { println(\"hi\"); return 0; }");
    let io = parse(
        "package std.io;\n\
         void println(string message);\n\
         string input(string prompt);",
    );
    program.modules.insert(
        0,
        ResolvedModule {
            name: Some("std.io".to_owned()),
            package: io.package,
            statements: io.statements,
            builtin: true,
        },
    );

    let unit = generate(&program).unwrap();

    // No prototype for the virtual declarations; only the helper.
    assert!(!unit.source.contains("std_io"));
    assert!(!unit.source.contains("void println"));
    assert!(unit.source.contains("thor_println(\"hi\");"));
}

#[test]
fn generation_is_deterministic() {
    let source = "int main() {\n\
                      string s = input(\"> \");\n\
                      if (s == \"go\") println(\"%s!\" % [s]);\n\
                      return 0;\n\
                  }";

    let first = gen(source);
    let second = gen(source);
    assert_eq!(first.source, second.source);
}
