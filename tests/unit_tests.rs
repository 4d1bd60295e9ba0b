//! End-to-end tests driving the full pipeline through the public facade.
//!
//! These exercise parse + compile + invoke the way an embedding
//! application does: literals and operators, host classes registered at
//! startup, extension methods, static classes, and the per-instance
//! settings knobs.

use std::sync::{Arc, Once};

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use dynexpr::{
    eval, eval_with, parse_and_compile, to_fn0, to_fn1, to_fn2, BinaryKind, CallContext,
    ClassEntry, CompileError, CompiledExpr, Compiler, EvalError, Evaluator, ExprError,
    ExtensionEntry, ExtensionIndex, Ir, MethodEntry, NamedTy, NativeObject, ParamDef, Settings,
    SyntaxError, Token, Ty, TyScheme, TypeRegistry, UnaryKind, Value,
};

const COMPANY_ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

/// Host state carried behind the `Company` class used across these tests.
struct CompanyState {
    name: &'static str,
    id: Uuid,
    employees: Vec<i32>,
    founded: NaiveDateTime,
}

fn company_ty() -> Ty {
    Ty::Named(NamedTy::plain("Company"))
}

fn company_state(value: &Value) -> Result<&CompanyState, EvalError> {
    value.downcast_ref::<CompanyState>()
}

/// Wrap fixture state as a `Company` host value.
fn company(name: &'static str, employees: &[i32]) -> Value {
    let founded = NaiveDate::from_ymd_opt(2008, 5, 15)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap();
    Value::Native(NativeObject::new(
        NamedTy::plain("Company"),
        CompanyState {
            name,
            id: Uuid::parse_str(COMPANY_ID).unwrap(),
            employees: employees.to_vec(),
            founded,
        },
    ))
}

/// Register the host classes and extensions once per process.
fn fixtures() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| {
        let registry = TypeRegistry::global();
        registry.register(
            ClassEntry::new(NamedTy::plain("Organization"))
                .with_property("Kind", Ty::Str, |_| Ok(Value::from("organization"))),
        );
        registry.register(ClassEntry::interface("Entity"));
        registry.register(
            ClassEntry::new(NamedTy::plain("Company"))
                .with_base(NamedTy::plain("Organization"))
                .with_interface(NamedTy::plain("Entity"))
                .with_property("Name", Ty::Str, |v| Ok(Value::from(company_state(v)?.name)))
                .with_property("Id", Ty::Guid, |v| Ok(Value::Guid(company_state(v)?.id)))
                .with_property("Archived", Ty::DateTime.nullable(), |_| Ok(Value::Null))
                .with_property("Founded", Ty::DateTime, |v| {
                    Ok(Value::DateTime(company_state(v)?.founded))
                })
                .with_property("Size", Ty::Int32, |v| {
                    Ok(Value::Int32(company_state(v)?.employees.len() as i32))
                })
                .with_property("Employees", Ty::Int32.array_of(), |v| {
                    let staff = &company_state(v)?.employees;
                    Ok(Value::array(
                        Ty::Int32,
                        staff.iter().copied().map(Value::Int32).collect(),
                    ))
                })
                .with_field("Ticker", Ty::Str, |v| {
                    Ok(Value::from(company_state(v)?.name.to_uppercase()))
                })
                .with_method(MethodEntry::instance(
                    "Label",
                    Vec::new(),
                    Ty::Str,
                    |cx: CallContext<'_>| {
                        Ok(Value::from(format!(
                            "company {}",
                            company_state(cx.arg(0)?)?.name
                        )))
                    },
                ))
                .with_method(MethodEntry::instance(
                    "Pay",
                    vec![
                        ParamDef::required("amount", Ty::Int32),
                        ParamDef::optional("bonus", Ty::Int32, Value::Int32(10)),
                    ],
                    Ty::Int32,
                    |cx: CallContext<'_>| Ok(Value::Int32(cx.i32_arg(1)? + cx.i32_arg(2)?)),
                )),
        );

        let extensions = ExtensionIndex::global();
        // same name as the instance method; resolution must prefer the class
        extensions.register(ExtensionEntry::new(
            "Label",
            0,
            TyScheme::concrete(company_ty()),
            Vec::new(),
            TyScheme::concrete(Ty::Str),
            |_cx: CallContext<'_>| Ok(Value::from("extension label")),
        ));
        extensions.register(ExtensionEntry::new(
            "EntityKind",
            0,
            TyScheme::concrete(Ty::Named(NamedTy::plain("Entity"))),
            Vec::new(),
            TyScheme::concrete(Ty::Str),
            |_cx: CallContext<'_>| Ok(Value::from("entity")),
        ));
    });
}

/// Evaluate a parameterless expression, panicking on failure.
fn ok(source: &str) -> Value {
    eval(source).unwrap_or_else(|e| panic!("{source:?} failed: {e}"))
}

/// Evaluate a parameterless expression expecting failure.
fn err(source: &str) -> ExprError {
    match eval(source) {
        Ok(value) => panic!("{source:?} unexpectedly produced {value:?}"),
        Err(e) => e,
    }
}

/// Compile a one-parameter expression over the `Company` host type.
fn compile_company(source: &str) -> CompiledExpr {
    fixtures();
    parse_and_compile(source, &[company_ty()])
        .unwrap_or_else(|e| panic!("{source:?} failed to compile: {e}"))
}

/// Compile and invoke over the default fixture company.
fn run_company(source: &str) -> Value {
    compile_company(source)
        .invoke(&[company("netflix", &[30, 60, 90])])
        .unwrap_or_else(|e| panic!("{source:?} failed to evaluate: {e}"))
}

fn assert_f64(value: Value, want: f64) {
    match value {
        Value::Float64(f) => assert!((f - want).abs() < 1e-9, "got {f}, want {want}"),
        other => panic!("expected Float64, got {other:?}"),
    }
}

fn assert_f32(value: Value, want: f32) {
    match value {
        Value::Float32(f) => assert!((f - want).abs() < 1e-5, "got {f}, want {want}"),
        other => panic!("expected Float32, got {other:?}"),
    }
}

// =============================================================================
// Literals and Operators
// =============================================================================

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(ok("1 + 2 * 3"), Value::Int32(7));
    assert_eq!(ok("(1 + 2) * 3"), Value::Int32(9));
    assert_eq!(ok("2 * 3 - 4 / 2"), Value::Int32(4));
    assert_eq!(ok("7 % 3"), Value::Int32(1));
    assert_eq!(ok("-(2 + 3)"), Value::Int32(-5));
}

#[test]
fn test_numeric_literal_shapes() {
    assert_eq!(dynexpr::parse("42").unwrap(), Token::literal(42i32));
    assert_f32(ok("42.5"), 42.5);
    assert_eq!(ok("4200000000"), Value::Int64(4_200_000_000));
    assert!(matches!(
        err("12ab"),
        ExprError::Syntax(SyntaxError::IdentAfterNumber { .. })
    ));
}

#[test]
fn test_string_escapes() {
    assert_eq!(ok(r#""4\"2""#), Value::from("4\"2"));
    assert_eq!(ok(r#""a\nb\tc""#), Value::from("a\nb\tc"));
    // unknown escapes keep the backslash
    assert_eq!(ok(r#""a\qb""#), Value::from(r"a\qb"));
}

#[test]
fn test_comparison_and_logic() {
    assert_eq!(ok("2 > 1 && 1 != 2"), Value::Bool(true));
    assert_eq!(ok("10 >= 10 || false"), Value::Bool(true));
    assert_eq!(ok("true && !false"), Value::Bool(true));
    // short circuit keeps the divide from running
    assert_eq!(ok("false && 1 / 0 == 0"), Value::Bool(false));
}

#[test]
fn test_bitwise_and_shifts() {
    assert_eq!(ok("6 & 3"), Value::Int32(2));
    assert_eq!(ok("6 | 3"), Value::Int32(7));
    assert_eq!(ok("6 ^ 3"), Value::Int32(5));
    assert_eq!(ok("1 << 4"), Value::Int32(16));
    assert_eq!(ok("256 >> 4"), Value::Int32(16));
    assert_eq!(ok("~0"), Value::Int32(-1));
}

#[test]
fn test_division_by_zero_reports() {
    assert!(matches!(err("1 / 0"), ExprError::Eval(_)));
    assert!(matches!(err("1 % 0"), ExprError::Eval(_)));
}

#[test]
fn test_string_concatenation_stringifies() {
    assert_eq!(ok(r#""4" + 2"#), Value::from("42"));
    assert_eq!(ok(r#"1 + "2""#), Value::from("12"));
}

#[test]
fn test_null_and_coalesce() {
    assert_eq!(ok("null ?? 42"), Value::Int32(42));
    assert_eq!(ok("null == null"), Value::Bool(true));
    assert_eq!(ok("1 == null"), Value::Bool(false));
    assert_eq!(ok("true ? 1 : 2"), Value::Int32(1));
}

// =============================================================================
// String Interpolation
// =============================================================================

#[test]
fn test_interpolation_folds_segments() {
    let answer = Evaluator::new()
        .positional("panic")
        .eval(r#"$"don't {@0}, 42""#)
        .unwrap();
    assert_eq!(answer, Value::from("don't panic, 42"));
    assert_eq!(ok(r#"$"4{1 + 1}""#), Value::from("42"));
}

#[test]
fn test_lone_interpolation_keeps_its_type() {
    assert_eq!(ok(r#"$"{1 + 1}""#), Value::Int32(2));
}

#[test]
fn test_unterminated_strings_report() {
    assert!(matches!(
        err(r#""open"#),
        ExprError::Syntax(SyntaxError::UnterminatedString { .. })
    ));
    assert!(matches!(
        err(r#"$"don't {@0"#),
        ExprError::Syntax(SyntaxError::UnterminatedInterpolation { .. })
    ));
}

// =============================================================================
// Records
// =============================================================================

#[test]
fn test_record_equality_ignores_member_order() {
    assert_eq!(
        ok("new { a = 4, b = 2 } == new { b = 2, a = 4 }"),
        Value::Bool(true)
    );
    assert_eq!(
        ok(r#"new { a = 4, b = "x" } == new { a = 4, b = 2 }"#),
        Value::Bool(false)
    );
}

#[test]
fn test_record_member_shorthand() {
    let answer = Evaluator::new()
        .variable("width", 6)
        .eval("new { width, Area = width * 7 }.Area")
        .unwrap();
    assert_eq!(answer, Value::Int32(42));
}

#[test]
fn test_record_renders_members_in_order() {
    assert_eq!(
        ok(r#"new { RenderTotal = 12, RenderTag = "x" }.ToString()"#),
        Value::from("{RenderTotal=12, RenderTag=x}")
    );
}

// =============================================================================
// Arrays, Maps, and Sequences
// =============================================================================

#[test]
fn test_array_literals_and_indexing() {
    assert_eq!(ok("[1, 2, 3][2]"), Value::Int32(3));
    assert_eq!(ok("new [] { 4, 5 }[0]"), Value::Int32(4));
    assert!(matches!(
        err("[1, 2][5]"),
        ExprError::Eval(EvalError::IndexOutOfRange { index: 5, len: 2 })
    ));
}

#[test]
fn test_map_members_fall_back_to_the_indexer() {
    let ev = Evaluator::new().variable(
        "m",
        Value::map([("name".to_string(), Value::from("amazon"))]),
    );
    assert_eq!(ev.eval("m.name").unwrap(), Value::from("amazon"));
    assert_eq!(ev.eval(r#"m["name"]"#).unwrap(), Value::from("amazon"));
    assert_eq!(ev.eval("m.Count").unwrap(), Value::Int32(1));
    assert!(matches!(
        ev.eval("m.missing").unwrap_err(),
        ExprError::Eval(EvalError::KeyNotFound { .. })
    ));
}

#[test]
fn test_sequence_extensions_on_array_literals() {
    assert_eq!(ok("[1, 2, 3].Sum()"), Value::Int32(6));
    assert_eq!(ok("[1, 2, 3].Where(x => x % 2 == 1).Count()"), Value::Int32(2));
    assert_eq!(ok("[1, 2, 3].Select(x => x * x).Max()"), Value::Int32(9));
    assert_eq!(ok("[1, 2, 3].First(x => x > 1)"), Value::Int32(2));
    assert_eq!(ok("[1, 2, 3].Contains(2)"), Value::Bool(true));
    assert_eq!(ok("[1, 2, 3].All(x => x > 0)"), Value::Bool(true));
    assert_f64(ok("[1, 2, 3].Average()"), 2.0);
}

#[test]
fn test_strings_are_char_sequences() {
    assert_eq!(ok(r#""hello".Count()"#), Value::Int32(5));
    assert_eq!(ok(r#""hello".First()"#), Value::Char('h'));
    assert_eq!(ok(r#""hello"[1]"#), Value::Char('e'));
}

// =============================================================================
// String Builtins
// =============================================================================

#[test]
fn test_string_members() {
    assert_eq!(ok(r#""Don't Panic".Length"#), Value::Int32(11));
    assert_eq!(ok(r#""Don't".ToUpper()"#), Value::from("DON'T"));
    assert_eq!(ok(r#""Don't".ToLower()"#), Value::from("don't"));
    assert_eq!(ok(r#""  x  ".Trim()"#), Value::from("x"));
    assert_eq!(ok(r#""panic".Contains("ani")"#), Value::Bool(true));
    assert_eq!(ok(r#""panic".StartsWith("pan")"#), Value::Bool(true));
    assert_eq!(ok(r#""panic".EndsWith("ic")"#), Value::Bool(true));
    assert_eq!(ok(r#""panic".IndexOf("n")"#), Value::Int32(2));
    assert_eq!(ok(r#""panic".IndexOf("z")"#), Value::Int32(-1));
    assert_eq!(ok(r#""a-b-c".Replace("-", "+")"#), Value::from("a+b+c"));
}

#[test]
fn test_substring_defaults_its_length() {
    assert_eq!(ok(r#""panic".Substring(1)"#), Value::from("anic"));
    assert_eq!(ok(r#""panic".Substring(1, 3)"#), Value::from("ani"));
}

#[test]
fn test_every_value_answers_to_string() {
    assert_eq!(ok("(1 + 1).ToString()"), Value::from("2"));
    assert_eq!(ok("true.ToString()"), Value::from("true"));
    // null renders as the empty string
    assert_eq!(ok("null.ToString()"), Value::from(""));
}

// =============================================================================
// Host Objects
// =============================================================================

#[test]
fn test_host_properties_resolve_through_the_base_chain() {
    assert_eq!(run_company("c => c.Name"), Value::from("netflix"));
    assert_eq!(run_company("c => c.Size"), Value::Int32(3));
    assert_eq!(run_company("c => c.Kind"), Value::from("organization"));
}

#[test]
fn test_registered_fields_resolve_like_properties() {
    assert_eq!(run_company("c => c.Ticker"), Value::from("NETFLIX"));
}

#[test]
fn test_instance_methods_win_over_extensions() {
    assert_eq!(run_company("c => c.Label()"), Value::from("company netflix"));
}

#[test]
fn test_interface_keyed_extensions_apply() {
    assert_eq!(run_company("c => c.EntityKind()"), Value::from("entity"));
}

#[test]
fn test_default_arguments_fill_trailing_parameters() {
    assert_eq!(run_company("c => c.Pay(100)"), Value::Int32(110));
    assert_eq!(run_company("c => c.Pay(100, 1)"), Value::Int32(101));
}

#[test]
fn test_sole_parameter_reaches_members_bare() {
    assert_eq!(run_company("Name"), Value::from("netflix"));
    assert_eq!(run_company("Size + 1"), Value::Int32(4));
    assert_eq!(run_company("Label()"), Value::from("company netflix"));
}

#[test]
fn test_guid_members_compare_against_literals() {
    let source = format!("c => c.Id == \"{COMPANY_ID}\"");
    assert_eq!(run_company(&source), Value::Bool(true));

    fixtures();
    let bad = parse_and_compile(r#"c => c.Id == "not a guid""#, &[company_ty()]);
    assert!(matches!(
        bad.unwrap_err(),
        ExprError::Compile(CompileError::BadTypedLiteral { .. })
    ));
}

#[test]
fn test_nullable_members_compare_against_null() {
    assert_eq!(run_company("c => c.Archived == null"), Value::Bool(true));
    assert_eq!(run_company("c => c.Archived != null"), Value::Bool(false));
}

#[test]
fn test_datetime_members_and_literal_comparison() {
    assert_eq!(run_company("c => c.Founded.Year"), Value::Int32(2008));
    assert_eq!(
        run_company("c => c.Founded.AddYears(10).Year"),
        Value::Int32(2018)
    );
    assert_eq!(
        run_company(r#"c => c.Founded < "2030-01-01T00:00:00""#),
        Value::Bool(true)
    );
}

#[test]
fn test_sequences_chain_over_host_arrays() {
    assert_eq!(run_company("c => c.Employees.Sum()"), Value::Int32(180));
    assert_eq!(
        run_company("c => c.Employees.Where(e => e > 50).Count()"),
        Value::Int32(2)
    );
    assert_eq!(
        run_company("c => c.Employees.Select(e => e / 30).Sum()"),
        Value::Int32(6)
    );
}

// =============================================================================
// Static Classes
// =============================================================================

#[test]
fn test_math_statics_pick_overloads() {
    assert_eq!(ok("Math.Max(3, 9)"), Value::Int32(9));
    assert_f64(ok("Math.Min(1.5, 0.5)"), 0.5);
    assert_eq!(ok("Math.Abs(-4)"), Value::Int32(4));
    assert_f64(ok("Math.Sqrt(9.0)"), 3.0);
    assert_f64(ok("Math.Pow(2.0, 10.0)"), 1024.0);
    assert_eq!(ok("Math.PI > 3.14 && Math.PI < 3.15"), Value::Bool(true));
}

#[test]
fn test_math_round_defaults_to_bankers() {
    assert_f64(ok("Math.Round(2.5)"), 2.0);
    assert_f64(ok("Math.Round(3.5)"), 4.0);
    assert_f64(ok("Math.Round(2.567, 2)"), 2.57);
}

#[test]
fn test_datetime_statics() {
    assert_eq!(
        ok(r#"DateTime.Parse("2023-07-19T14:30:00").Year"#),
        Value::Int32(2023)
    );
    assert_eq!(
        ok(r#"DateTime.Parse("2023-07-19T14:30:00").Minute"#),
        Value::Int32(30)
    );
    assert_eq!(ok("DateTime.Now.Year >= 2024"), Value::Bool(true));
}

#[test]
fn test_guid_statics() {
    assert_eq!(
        ok(&format!("Guid.Parse(\"{COMPANY_ID}\").ToString()")),
        Value::from(COMPANY_ID)
    );
    assert_eq!(ok("Guid.NewGuid() == Guid.NewGuid()"), Value::Bool(false));
}

#[test]
fn test_static_names_are_not_values() {
    assert!(matches!(
        err("Math"),
        ExprError::Compile(CompileError::UnknownVariable { .. })
    ));
}

// =============================================================================
// Settings
// =============================================================================

#[test]
fn test_known_values_scope_to_their_settings() {
    let settings = Arc::new(Settings::new());
    settings.add_known_value("answer", Value::Int32(42));
    assert_eq!(eval_with("answer + 1", &settings).unwrap(), Value::Int32(43));
    assert!(matches!(
        err("answer + 1"),
        ExprError::Compile(CompileError::UnknownVariable { .. })
    ));
}

#[test]
fn test_custom_binary_operator_defaults_to_multiplicative_precedence() {
    let settings = Arc::new(Settings::new());
    settings.add_binary_operator("**", |left, right| {
        Ok(Ir::binary(BinaryKind::Multiply, left, right))
    });
    assert_eq!(eval_with("1 + 2 ** 3", &settings).unwrap(), Value::Int32(7));
}

#[test]
fn test_custom_unary_operator() {
    let settings = Arc::new(Settings::new());
    settings.add_unary_operator('#', |operand| Ok(Ir::unary(UnaryKind::Negate, operand)));
    assert_eq!(eval_with("#5", &settings).unwrap(), Value::Int32(-5));
}

#[test]
fn test_decimal_separator_is_configurable() {
    let settings = Arc::new(Settings::new());
    settings.set_decimal_separator(',');
    assert_f32(eval_with("1,5 + 2,25", &settings).unwrap(), 3.75);
}

#[test]
fn test_member_lookup_can_ignore_case() {
    let settings = Arc::new(Settings::new());
    settings.set_ignore_member_case(true);
    assert_eq!(eval_with(r#""abc".LENGTH"#, &settings).unwrap(), Value::Int32(3));
    assert_eq!(
        eval_with(r#""abc".TOUPPER()"#, &settings).unwrap(),
        Value::from("ABC")
    );
}

// =============================================================================
// Typed Wrappers and the Evaluator Builder
// =============================================================================

#[test]
fn test_parse_and_compile_reports_types() {
    let expr = parse_and_compile("(a, b) => a > b ? a : b", &[Ty::Int32, Ty::Int32]).unwrap();
    assert_eq!(expr.param_tys(), &[Ty::Int32, Ty::Int32]);
    assert_eq!(expr.ty(), Ty::Int32);
    assert_eq!(
        expr.invoke(&[Value::Int32(3), Value::Int32(9)]).unwrap(),
        Value::Int32(9)
    );
}

#[test]
fn test_typed_function_wrappers() {
    let double = to_fn1::<i32, i32>("x => x * 2", Ty::Int32).unwrap();
    assert_eq!(double(21).unwrap(), 42);

    let larger = to_fn2::<i32, i32, i32>("(a, b) => a > b ? a : b", (Ty::Int32, Ty::Int32)).unwrap();
    assert_eq!(larger(3, 9).unwrap(), 9);

    let tau = to_fn0::<f64>("Math.PI * 2").unwrap();
    assert!((tau().unwrap() - std::f64::consts::TAU).abs() < 1e-12);
}

#[test]
fn test_evaluator_binds_variables_and_positionals() {
    let ev = Evaluator::new().variable("rate", 3).positional("alpha");
    assert_eq!(ev.eval("rate * 14").unwrap(), Value::Int32(42));
    assert_eq!(ev.eval(r#"@0 + "!""#).unwrap(), Value::from("alpha!"));
}

#[test]
fn test_explicit_variables_shadow_positionals() {
    let answer = Evaluator::new()
        .variable("@0", "explicit")
        .positional("positional")
        .eval("@0")
        .unwrap();
    assert_eq!(answer, Value::from("explicit"));
}

#[test]
fn test_object_parameters_defer_typing_to_runtime() {
    let expr = parse_and_compile("x => x + 1", &[Ty::Object]).unwrap();
    assert_eq!(expr.invoke(&[Value::Int32(41)]).unwrap(), Value::Int32(42));
    assert_eq!(expr.invoke(&[Value::from("4")]).unwrap(), Value::from("41"));
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn test_blank_and_trailing_input_report() {
    assert!(matches!(
        err("   "),
        ExprError::Syntax(SyntaxError::BlankSource)
    ));
    assert!(matches!(
        err("1 1"),
        ExprError::Syntax(SyntaxError::TrailingInput { .. })
    ));
}

#[test]
fn test_resolution_failures_name_their_target() {
    match err("nope + 1") {
        ExprError::Compile(CompileError::UnknownVariable { name }) => assert_eq!(name, "nope"),
        other => panic!("unexpected error {other:?}"),
    }
    match err(r#""x".Frobnicate()"#) {
        ExprError::Compile(CompileError::UnknownMethod { name, .. }) => {
            assert_eq!(name, "Frobnicate")
        }
        other => panic!("unexpected error {other:?}"),
    }
    match err(r#""x".Wat"#) {
        ExprError::Compile(CompileError::UnknownMember { name, .. }) => assert_eq!(name, "Wat"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_condition_must_be_bool() {
    assert!(matches!(
        err("1 ? 2 : 3"),
        ExprError::Compile(CompileError::PredicateNotBool { .. })
    ));
}

#[test]
fn test_reflection_is_refused() {
    assert!(matches!(
        err(r#""x".GetType()"#),
        ExprError::Compile(CompileError::ForbiddenIntrospection { .. })
    ));
}

#[test]
fn test_misplaced_lambdas_are_rejected() {
    assert!(matches!(
        err("(x => x) + 1"),
        ExprError::Compile(CompileError::MisplacedLambda)
    ));
    assert!(matches!(
        parse_and_compile("x => x", &[Ty::Int32, Ty::Int32]).unwrap_err(),
        ExprError::Compile(CompileError::ParameterCountMismatch { expected: 1, got: 2 })
    ));
}

#[test]
fn test_hand_built_trees_diagnose_placement() {
    let assign = Token::Assign {
        name: "a".to_string(),
        right: Box::new(Token::literal(1i32)),
    };
    assert!(matches!(
        Compiler::new().compile(&assign, &[]),
        Err(CompileError::MisplacedToken { .. })
    ));

    // a parenthesized list only means something as call arguments
    let group = Token::Group {
        items: vec![Token::literal(1i32), Token::literal(2i32)],
    };
    assert!(matches!(
        Compiler::new().compile(&group, &[]),
        Err(CompileError::MisplacedToken { .. })
    ));

    let unknown = Token::binary("@@", Token::literal(1i32), Token::literal(2i32));
    match Compiler::new().compile(&unknown, &[]) {
        Err(CompileError::UnknownBinaryOperator { op }) => assert_eq!(op, "@@"),
        other => panic!("unexpected result {other:?}"),
    }
}
