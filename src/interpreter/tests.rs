use std::rc::Rc;

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::runtime::Runtime;
use super::*;
use crate::ast::{
    BinaryOperator, Block, ClassDef, Elif, Expression, FunctionDef, MethodDef, Program, Property,
    Statement,
};
use crate::runtime::factory::{NodeFactory, atom};
use crate::runtime::value::{Value, ValueKind};

fn name(identifier: &str) -> Expression {
    Expression::name(identifier)
}

fn int(value: i64) -> Expression {
    Expression::Integer(value)
}

fn string(value: &str) -> Expression {
    Expression::string(value)
}

fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
    Expression::binary(left, op, right)
}

fn call(callee: &str, arguments: Vec<Expression>) -> Expression {
    Expression::call(callee, arguments)
}

fn print(argument: Expression) -> Statement {
    Statement::Expression(call("print", vec![argument]))
}

fn assign(identifier: &str, expression: Expression) -> Statement {
    Statement::assign(identifier, expression)
}

fn block(statements: Vec<Statement>) -> Block {
    Block::new(statements)
}

fn if_then(expression: Expression, statements: Vec<Statement>) -> Statement {
    Statement::If {
        expression,
        block: block(statements),
        elifs: Vec::new(),
        else_block: None,
    }
}

fn function(identifier: &str, parameters: &[&str], body: Vec<Statement>) -> Statement {
    Statement::FunctionDef(Rc::new(FunctionDef::new(identifier, parameters, body)))
}

fn method(identifier: &str, parameters: &[&str], body: Vec<Statement>) -> Statement {
    Statement::MethodDef(Rc::new(MethodDef::new(identifier, parameters, body)))
}

fn property(identifier: &str) -> Statement {
    Statement::Property(Rc::new(Property::new(identifier)))
}

fn class(identifier: &str, body: Vec<Statement>) -> Statement {
    Statement::ClassDef(Rc::new(ClassDef::new(identifier, Vec::new(), body)))
}

fn point_class() -> Statement {
    class(
        "Point",
        vec![
            property("x"),
            property("y"),
            method(
                "Point",
                &["a", "b"],
                vec![assign("x", name("a")), assign("y", name("b"))],
            ),
            method("getx", &[], vec![Statement::ret(name("x"))]),
        ],
    )
}

fn run_program(interpreter: &Interpreter, statements: Vec<Statement>) -> Result<Evaluation, RuntimeError> {
    interpreter.run(&Program::new(statements))
}

fn output_of(statements: Vec<Statement>) -> Vec<String> {
    run_program(&Interpreter::new(), statements)
        .expect("run failed")
        .output
}

fn result_of(statements: Vec<Statement>) -> Option<Value> {
    run_program(&Interpreter::new(), statements)
        .expect("run failed")
        .result
        .map(|node| node.value())
}

fn error_of(statements: Vec<Statement>) -> RuntimeError {
    run_program(&Interpreter::new(), statements).expect_err("run should fail")
}

/// Runs a program on a bare runtime so tests can inspect the scope arena afterwards.
fn with_runtime(statements: Vec<Statement>, inspect: impl FnOnce(&Runtime<'_>)) {
    let factory = NodeFactory::default();
    let mut output = Vec::new();
    let mut runtime = Runtime::new(&factory, &mut output, DEFAULT_MAX_CALL_DEPTH);
    BuiltinRegistry::new().install(&mut runtime.scopes);
    runtime
        .exec_program(&Program::new(statements))
        .expect("run failed");
    inspect(&runtime);
}

#[test]
fn evaluates_assignment_and_print() {
    let output = output_of(vec![
        assign("n", binary(int(1), BinaryOperator::Plus, int(2))),
        print(name("n")),
    ]);
    assert_eq!(output, vec!["3"]);
}

#[test]
fn reassignment_reads_the_latest_binding() {
    let statements = vec![
        assign("x", int(1)),
        assign("x", int(2)),
        assign("x", int(3)),
        Statement::ret(name("x")),
    ];
    assert_eq!(result_of(statements.clone()), Some(Value::Integer(3)));

    with_runtime(statements, |runtime| {
        let symbol = runtime
            .scopes
            .lookup(runtime.scopes.main(), "x")
            .expect("x is bound");
        assert_eq!(symbol.history_len(), 3);
    });
}

#[test]
fn parameters_are_not_visible_after_the_call_returns() {
    let error = error_of(vec![
        function("inner", &["a"], vec![Statement::ret(name("a"))]),
        function(
            "outer",
            &["b"],
            vec![Statement::ret(call("inner", vec![name("b")]))],
        ),
        print(call("outer", vec![int(5)])),
        print(name("b")),
    ]);
    assert_eq!(
        error,
        RuntimeError::UndefinedVariable {
            name: "b".to_string()
        }
    );
}

#[test]
fn callee_does_not_see_caller_parameters_through_arguments() {
    let output = output_of(vec![
        assign("a", int(1)),
        function("show", &["a"], vec![print(name("a"))]),
        function("wrap", &["a"], vec![Statement::Expression(call("show", vec![int(2)]))]),
        Statement::Expression(call("wrap", vec![int(3)])),
        print(name("a")),
    ]);
    assert_eq!(output, vec!["2", "1"]);
}

#[test]
fn return_inside_nested_ifs_in_a_loop_ends_the_call() {
    let output = output_of(vec![
        function(
            "first_over_two",
            &[],
            vec![
                assign("i", int(0)),
                Statement::Loop {
                    expression: binary(name("i"), BinaryOperator::Less, int(10)),
                    block: block(vec![
                        assign("i", binary(name("i"), BinaryOperator::Plus, int(1))),
                        if_then(
                            binary(name("i"), BinaryOperator::Greater, int(2)),
                            vec![if_then(
                                binary(name("i"), BinaryOperator::EqEqual, int(3)),
                                vec![Statement::ret(name("i"))],
                            )],
                        ),
                        print(name("i")),
                    ]),
                },
                print(string("unreachable")),
            ],
        ),
        print(call("first_over_two", vec![])),
    ]);
    assert_eq!(output, vec!["1", "2", "3"]);
}

#[test]
fn break_stops_iterate_and_the_variable_stays_bound() {
    let output = output_of(vec![
        Statement::Iterate {
            iterable: Expression::List(vec![int(1), int(2), int(3)]),
            variable: "x".into(),
            block: block(vec![
                if_then(
                    binary(name("x"), BinaryOperator::EqEqual, int(2)),
                    vec![Statement::Break],
                ),
                print(name("x")),
            ]),
        },
        print(name("x")),
    ]);
    assert_eq!(output, vec!["1", "2"]);
}

#[test]
fn continue_skips_the_rest_of_the_iteration() {
    let output = output_of(vec![Statement::Iterate {
        iterable: Expression::Tuple(vec![int(1), int(2), int(3)]),
        variable: "x".into(),
        block: block(vec![
            if_then(
                binary(name("x"), BinaryOperator::EqEqual, int(2)),
                vec![Statement::Continue],
            ),
            print(name("x")),
        ]),
    }]);
    assert_eq!(output, vec!["1", "3"]);
}

#[test]
fn loop_continue_rechecks_the_condition() {
    let output = output_of(vec![
        assign("n", int(0)),
        Statement::Loop {
            expression: binary(name("n"), BinaryOperator::Less, int(4)),
            block: block(vec![
                assign("n", binary(name("n"), BinaryOperator::Plus, int(1))),
                if_then(
                    binary(
                        binary(name("n"), BinaryOperator::Percent, int(2)),
                        BinaryOperator::EqEqual,
                        int(1),
                    ),
                    vec![Statement::Continue],
                ),
                print(name("n")),
            ]),
        },
    ]);
    assert_eq!(output, vec!["2", "4"]);
}

#[test]
fn iterate_walks_strings_and_dict_keys() {
    let output = output_of(vec![
        Statement::Iterate {
            iterable: string("ab"),
            variable: "ch".into(),
            block: block(vec![print(name("ch"))]),
        },
        Statement::Iterate {
            iterable: Expression::Dict(vec![(string("k"), int(1)), (int(2), Expression::Null)]),
            variable: "key".into(),
            block: block(vec![print(name("key"))]),
        },
    ]);
    assert_eq!(output, vec!["a", "b", "k", "2"]);
}

#[test]
fn iterate_over_an_integer_fails() {
    let error = error_of(vec![Statement::Iterate {
        iterable: int(3),
        variable: "x".into(),
        block: block(vec![]),
    }]);
    assert_eq!(
        error,
        RuntimeError::NotIterable {
            type_name: "Integer".to_string()
        }
    );
}

#[test]
fn elif_with_its_own_else_takes_it_when_the_guard_fails() {
    let output = output_of(vec![Statement::If {
        expression: Expression::Boolean(false),
        block: block(vec![print(string("if"))]),
        elifs: vec![
            Elif {
                expression: Expression::Boolean(false),
                block: block(vec![print(string("first elif"))]),
                else_block: Some(block(vec![print(string("first elif else"))])),
            },
            Elif {
                expression: Expression::Boolean(true),
                block: block(vec![print(string("second elif"))]),
                else_block: None,
            },
        ],
        else_block: Some(block(vec![print(string("else"))])),
    }]);
    assert_eq!(output, vec!["first elif else"]);
}

#[test]
fn if_falls_back_to_else_and_yields_nothing_otherwise() {
    let output = output_of(vec![
        Statement::If {
            expression: Expression::Null,
            block: block(vec![print(string("then"))]),
            elifs: vec![Elif {
                expression: int(0),
                block: block(vec![print(string("elif"))]),
                else_block: None,
            }],
            else_block: Some(block(vec![print(string("else"))])),
        },
        if_then(Expression::Boolean(false), vec![print(string("skipped"))]),
    ]);
    assert_eq!(output, vec!["else"]);
}

#[test]
fn operators_produce_fresh_atoms() {
    assert_eq!(
        result_of(vec![Statement::ret(binary(int(2), BinaryOperator::Plus, int(3)))]),
        Some(Value::Integer(5))
    );
    assert_eq!(
        result_of(vec![Statement::ret(binary(
            string("a"),
            BinaryOperator::Plus,
            string("b")
        ))]),
        Some(Value::string("ab"))
    );
}

#[test]
fn or_and_select_an_operand_after_evaluating_both() {
    let output = output_of(vec![
        function("noisy", &["v"], vec![print(name("v")), Statement::ret(name("v"))]),
        print(binary(
            call("noisy", vec![int(1)]),
            BinaryOperator::Or,
            call("noisy", vec![int(2)]),
        )),
        print(binary(int(0), BinaryOperator::And, name("noisy"))),
    ]);
    assert_eq!(output, vec!["1", "2", "1", "0"]);
}

#[test]
fn mismatched_operands_abort_the_run() {
    let error = error_of(vec![print(binary(string("a"), BinaryOperator::Minus, int(1)))]);
    assert_eq!(
        error,
        RuntimeError::TypeMismatch {
            operator: "-".to_string(),
            left: "String".to_string(),
            right: "Integer".to_string(),
        }
    );
}

#[test]
fn class_instantiation_and_member_assignment() {
    let output = output_of(vec![
        point_class(),
        assign("point", call("Point", vec![int(1), int(2)])),
        print(Expression::dot(name("point"), "x")),
        print(Expression::dot(name("point"), "y")),
        Statement::assign_member(name("point"), "x", int(9)),
        print(Expression::method_call(name("point"), "getx", vec![])),
        print(name("point")),
    ]);
    assert_eq!(output, vec!["1", "2", "9", "<Point instance>"]);
}

#[test]
fn instances_do_not_share_state() {
    let output = output_of(vec![
        point_class(),
        assign("p", call("Point", vec![int(1), int(2)])),
        assign("q", call("Point", vec![int(3), int(4)])),
        Statement::assign_member(name("p"), "x", int(7)),
        print(Expression::method_call(name("p"), "getx", vec![])),
        print(Expression::method_call(name("q"), "getx", vec![])),
    ]);
    assert_eq!(output, vec!["7", "3"]);
}

#[test]
fn methods_can_call_sibling_methods_and_mutate_properties() {
    let output = output_of(vec![
        class(
            "Counter",
            vec![
                property("count"),
                method("Counter", &[], vec![assign("count", int(0))]),
                method(
                    "bump",
                    &[],
                    vec![assign("count", binary(name("count"), BinaryOperator::Plus, int(1)))],
                ),
                method(
                    "twice",
                    &[],
                    vec![
                        Statement::Expression(call("bump", vec![])),
                        Statement::Expression(call("bump", vec![])),
                        Statement::ret(name("count")),
                    ],
                ),
            ],
        ),
        assign("c", call("Counter", vec![])),
        print(Expression::method_call(name("c"), "twice", vec![])),
        print(Expression::dot(name("c"), "count")),
    ]);
    assert_eq!(output, vec!["2", "2"]);
}

#[test]
fn constructor_arity_is_checked() {
    let error = error_of(vec![point_class(), Statement::Expression(call("Point", vec![int(1)]))]);
    assert_eq!(
        error,
        RuntimeError::ArityMismatch {
            name: "Point".to_string(),
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn classes_without_a_constructor_take_no_arguments() {
    let output = output_of(vec![
        class("Empty", vec![property("value")]),
        assign("e", call("Empty", vec![])),
        print(Expression::dot(name("e"), "value")),
    ]);
    assert_eq!(output, vec!["<property value>"]);
}

#[test]
fn assigning_an_undeclared_member_fails() {
    let error = error_of(vec![
        point_class(),
        assign("p", call("Point", vec![int(1), int(2)])),
        Statement::assign_member(name("p"), "z", int(0)),
    ]);
    assert_eq!(
        error,
        RuntimeError::UnknownMember {
            member: "z".to_string(),
            type_name: "Point".to_string(),
        }
    );
}

#[test]
fn print_is_called_once_and_evaluates_to_null() {
    let evaluation = run_program(
        &Interpreter::new(),
        vec![
            assign("r", call("print", vec![string("hello")])),
            Statement::ret(name("r")),
        ],
    )
    .expect("run failed");
    assert_eq!(evaluation.output, vec!["hello"]);
    assert_eq!(evaluation.result.map(|node| node.value()), Some(Value::Null));
}

#[test]
fn native_methods_dispatch_on_the_receiver_type() {
    let output = output_of(vec![
        assign("xs", Expression::List(vec![int(1)])),
        assign("xs", Expression::method_call(name("xs"), "append", vec![int(2)])),
        print(name("xs")),
        print(call("len", vec![name("xs")])),
        print(Expression::method_call(string("a,b"), "split", vec![string(",")])),
        print(call("type", vec![name("xs")])),
    ]);
    assert_eq!(output, vec!["[1, 2]", "2", "['a', 'b']", "List"]);
}

#[test]
fn native_classes_convert_their_arguments() {
    let output = output_of(vec![
        print(binary(
            call("Integer", vec![string("40")]),
            BinaryOperator::Plus,
            int(2),
        )),
        print(call("List", vec![call("range", vec![int(3)])])),
        print(call("Complex", vec![int(1), int(2)])),
    ]);
    assert_eq!(output, vec!["42", "[0, 1, 2]", "(1+2j)"]);
}

#[test]
fn undefined_names_are_reported() {
    let error = error_of(vec![print(name("missing"))]);
    assert_eq!(
        error,
        RuntimeError::UndefinedVariable {
            name: "missing".to_string()
        }
    );
}

#[test]
fn calling_a_non_callable_fails() {
    let error = error_of(vec![
        assign("x", int(1)),
        Statement::Expression(call("x", vec![])),
    ]);
    assert_eq!(
        error,
        RuntimeError::ObjectNotCallable {
            type_name: "Integer".to_string()
        }
    );
}

#[test]
fn arity_mismatch_names_the_callee() {
    let error = error_of(vec![
        function("f", &["a"], vec![]),
        Statement::Expression(call("f", vec![])),
    ]);
    assert_eq!(
        error,
        RuntimeError::ArityMismatch {
            name: "f".to_string(),
            expected: 1,
            found: 0,
        }
    );
    assert_eq!(error.to_string(), "Function 'f' expected 1 arguments, got 0");
}

#[test]
fn functions_without_return_evaluate_to_null() {
    let output = output_of(vec![
        function("nothing", &[], vec![assign("x", int(1))]),
        print(call("nothing", vec![])),
    ]);
    assert_eq!(output, vec!["Null"]);
}

#[test]
fn redeclaring_a_function_shadows_it() {
    let output = output_of(vec![
        function("f", &[], vec![Statement::ret(int(1))]),
        function("f", &[], vec![Statement::ret(int(2))]),
        print(call("f", vec![])),
    ]);
    assert_eq!(output, vec!["2"]);
}

#[test]
fn loop_control_outside_a_loop_fails() {
    assert_eq!(
        error_of(vec![Statement::Break]),
        RuntimeError::LoopControlOutsideLoop {
            keyword: "break".to_string()
        }
    );
    assert_eq!(
        error_of(vec![
            function("f", &[], vec![Statement::Continue]),
            Statement::Expression(call("f", vec![])),
        ]),
        RuntimeError::LoopControlOutsideLoop {
            keyword: "continue".to_string()
        }
    );
}

#[test]
fn loop_control_escaping_a_constructor_fails() {
    let error = error_of(vec![
        class("Box", vec![method("Box", &[], vec![Statement::Break])]),
        Statement::Expression(call("Box", vec![])),
        print(string("after")),
    ]);
    assert_eq!(
        error,
        RuntimeError::LoopControlOutsideLoop {
            keyword: "break".to_string()
        }
    );
}

#[test]
fn large_integers_stay_distinct_in_programs() {
    let big = 1_i64 << 53;
    let evaluation = run_program(
        &Interpreter::new(),
        vec![
            print(binary(int(big + 1), BinaryOperator::EqEqual, int(big))),
            Statement::ret(call(
                "len",
                vec![Expression::Dict(vec![
                    (int(big + 1), string("a")),
                    (int(big), string("b")),
                ])],
            )),
        ],
    )
    .expect("run failed");
    assert_eq!(evaluation.output, vec!["False"]);
    assert_eq!(evaluation.result.map(|node| node.value()), Some(Value::Integer(2)));
}

fn countdown() -> Statement {
    function(
        "countdown",
        &["n"],
        vec![
            if_then(
                binary(name("n"), BinaryOperator::EqEqual, int(0)),
                vec![Statement::ret(int(0))],
            ),
            Statement::ret(call(
                "countdown",
                vec![binary(name("n"), BinaryOperator::Minus, int(1))],
            )),
        ],
    )
}

#[test]
fn recursion_beyond_the_configured_depth_fails() {
    let interpreter = Interpreter::new().with_config(InterpreterConfig { max_call_depth: 50 });
    let error = run_program(
        &interpreter,
        vec![countdown(), Statement::Expression(call("countdown", vec![int(60)]))],
    )
    .expect_err("too deep");
    assert_eq!(error, RuntimeError::RecursionLimit { limit: 50 });

    let evaluation = run_program(
        &interpreter,
        vec![countdown(), Statement::ret(call("countdown", vec![int(40)]))],
    )
    .expect("within limit");
    assert_eq!(evaluation.result.map(|node| node.value()), Some(Value::Integer(0)));
}

#[test]
fn default_depth_is_reachable() {
    let value = result_of(vec![
        countdown(),
        Statement::ret(call("countdown", vec![int(900)])),
    ]);
    assert_eq!(value, Some(Value::Integer(0)));
}

#[test]
fn injected_factory_controls_which_results_can_be_wrapped() {
    let mut factory = NodeFactory::empty();
    factory.register(ValueKind::String, atom);
    let interpreter = Interpreter::new().with_factory(factory);

    let error = run_program(
        &interpreter,
        vec![Statement::ret(binary(int(2), BinaryOperator::Plus, int(3)))],
    )
    .expect_err("integers are not registered");
    assert_eq!(
        error,
        RuntimeError::UnwrappableValue {
            type_name: "Integer".to_string()
        }
    );

    let evaluation = run_program(
        &interpreter,
        vec![Statement::ret(binary(string("a"), BinaryOperator::Plus, string("b")))],
    )
    .expect("strings are registered");
    assert_eq!(evaluation.result.map(|node| node.value()), Some(Value::string("ab")));
}

#[test]
fn finished_frames_and_dropped_instances_release_their_scopes() {
    with_runtime(
        vec![
            function("id", &["a"], vec![Statement::ret(name("a"))]),
            Statement::Expression(call("id", vec![int(1)])),
            point_class(),
            Statement::Expression(call("Point", vec![int(1), int(2)])),
        ],
        |runtime| assert_eq!(runtime.scopes.live_scopes(), 1),
    );

    with_runtime(
        vec![point_class(), assign("p", call("Point", vec![int(1), int(2)]))],
        |runtime| assert_eq!(runtime.scopes.live_scopes(), 2),
    );
}

#[test]
fn runs_a_deserialized_program() {
    let json = indoc! {r#"
        {
          "block": [
            {"FunctionDef": {
              "name": "square",
              "parameters": [{"name": "n", "type_name": "Integer"}],
              "block": [
                {"Return": {"BinaryOp": {"left": {"Name": "n"}, "op": "Star", "right": {"Name": "n"}}}}
              ]
            }},
            {"Assignment": {"target": {"Name": "total"}, "expression": {"Integer": 0}}},
            {"Iterate": {
              "iterable": {"List": [{"Integer": 1}, {"Integer": 2}, {"Integer": 3}]},
              "variable": "i",
              "block": [
                {"Assignment": {
                  "target": {"Name": "total"},
                  "expression": {"BinaryOp": {
                    "left": {"Name": "total"},
                    "op": "Plus",
                    "right": {"Call": {"callee": {"Name": "square"}, "arguments": [{"Name": "i"}]}}
                  }}
                }}
              ]
            }},
            {"Expression": {"Call": {"callee": {"Name": "print"}, "arguments": [{"Name": "total"}]}}},
            {"Return": null}
          ]
        }
    "#};
    let program: Program = serde_json::from_str(json).expect("valid program json");
    let evaluation = Interpreter::new().run(&program).expect("run failed");
    assert_eq!(evaluation.output, vec!["14"]);
    assert_eq!(evaluation.result.map(|node| node.value()), Some(Value::Null));
}
