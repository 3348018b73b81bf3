use pna::{
    Binding, CapturedConsole, Console, Flow, Interpreter, Options, PnaError, Span,
    SubstitutionMode, Value,
};
use pretty_assertions::assert_eq;

fn interpreter() -> Interpreter<CapturedConsole> {
    Interpreter::with_options(CapturedConsole::new(), Options::default().with_seed(7))
}

fn eval(interpreter: &mut Interpreter<CapturedConsole>, expr: &str) -> Value {
    interpreter
        .evaluate(expr, &Span::new(0, expr.len()))
        .expect("expression evaluates")
}

#[test]
fn bare_literals_read_back_as_numbers() {
    let mut interp = interpreter();
    assert_eq!(eval(&mut interp, "3.14"), Value::Number(3.14));
    let whole = eval(&mut interp, "12");
    assert_eq!(whole, Value::Number(12.0));
    assert_eq!(whole.to_number().fract(), 0.0);
}

#[test]
fn variables_feed_expressions() {
    let mut interp = interpreter();
    interp.run("x : 5").expect("runs");
    assert_eq!(eval(&mut interp, "x + 1"), Value::Number(6.0));
}

#[test]
fn assignment_then_read_is_identity() {
    let mut interp = interpreter();
    interp
        .run("n : 42\ns : \"text with \\\"quotes\\\"\"\nb : true")
        .expect("runs");
    assert_eq!(eval(&mut interp, "n"), Value::Number(42.0));
    assert_eq!(eval(&mut interp, "s"), Value::from("text with \"quotes\""));
    assert_eq!(eval(&mut interp, "b"), Value::Bool(true));
}

#[test]
fn property_writes_merge_into_objects() {
    let mut interp = interpreter();
    interp
        .run("user: {\nname: \"Bob\"\n}\nuser.age : 30")
        .expect("runs");

    assert_eq!(eval(&mut interp, "user.age"), Value::Number(30.0));
    assert_eq!(eval(&mut interp, "user.name"), Value::from("Bob"));
    assert_eq!(
        interp.environment().get("user").map(Binding::to_string),
        Some("{age: 30, name: \"Bob\"}".to_string())
    );
}

#[test]
fn object_literal_rebinds_a_fresh_object() {
    let mut interp = interpreter();
    interp
        .run("cfg: {\na: 1\n}\ncfg.b : 2\ncfg: {\nc: 3\n}")
        .expect("runs");
    assert_eq!(interp.environment().get_field("cfg", "a"), None);
    assert_eq!(interp.environment().get_field("cfg", "b"), None);
    assert_eq!(
        interp.environment().get_field("cfg", "c"),
        Some(&Value::Number(3.0))
    );
}

#[test]
fn comment_only_lines_change_nothing() {
    let mut interp = interpreter();
    interp.run("# just a note\n   \n// and another").expect("runs");
    assert!(interp.environment().is_empty());
    assert!(interp.console().output.is_empty());
    assert!(interp.console().diagnostics.is_empty());
}

#[test]
fn loop_break_counts_iterations() {
    let mut interp = interpreter();
    let source = "\
i : 0
runs : 0
loop (i < 3) -> {
    runs : runs + 1
    cond (i == 1) -> {
        break
    }
    end
    i : i + 1
end";
    interp.run(source).expect("runs");
    assert_eq!(eval(&mut interp, "runs"), Value::Number(2.0));
}

#[test]
fn execute_returns_signals_as_values() {
    let mut interp = interpreter();
    let lines = pna::interpreter::normalize("log 1\ncontinue\nlog 2");
    let flow = interp.execute(&lines);
    assert_eq!(flow, Flow::Continue(lines[1].span.clone()));
    assert_eq!(interp.console().output, vec!["1".to_string()]);
}

#[test]
fn stray_break_points_at_its_line() {
    let mut interp = interpreter();
    let source = "log 1\n  break\n";
    let error: PnaError = interp.run(source).expect_err("break has no loop");
    assert_eq!(&source[error.span.start..error.span.end], "break");
    assert_eq!(error.render_plain(), "[RuntimeError] 'break' outside of a loop");
}

#[test]
fn state_persists_across_runs() {
    let mut interp = interpreter();
    interp.run("count : 1").expect("runs");
    interp.run("count : count + 1\nlog count").expect("runs");
    assert_eq!(interp.console().output, vec!["2".to_string()]);
}

#[test]
fn prompts_reach_the_console() {
    let console = CapturedConsole::with_input(["7", "x"]);
    let mut interp = Interpreter::new(console);
    interp
        .run("input \"Pick a number\" -> n\ninput \"NO\" -> s")
        .expect("runs");

    assert_eq!(
        interp.console().prompts,
        vec![Some("Pick a number".to_string()), None]
    );
    assert_eq!(eval(&mut interp, "n"), Value::Number(7.0));
    assert_eq!(eval(&mut interp, "s"), Value::from("x"));
}

#[test]
fn seeded_runs_repeat_their_dice() {
    let source = "a : random 1 100\nb : randint 1 100\nc : choice \"x\" \"y\" \"z\"\nlog a\nlog b\nlog c";
    let outputs: Vec<Vec<String>> = (0..2)
        .map(|_| {
            let mut interp = interpreter();
            interp.run(source).expect("runs");
            interp.into_console().output
        })
        .collect();
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn textual_substitution_mode_matches_on_plain_scripts() {
    let source = "\
total : 0
i : 1
loop (i <= 4) -> {
    total : total + i * 2
    i : i + 1
end
log total
user: {
    name: \"Ann\"
}
log \"hi \" + user.name";

    for mode in [SubstitutionMode::Deferred, SubstitutionMode::Textual] {
        let mut interp = Interpreter::with_options(
            CapturedConsole::new(),
            Options::default().with_substitution(mode),
        );
        interp.run(source).expect("runs");
        assert_eq!(
            interp.console().output,
            vec!["20".to_string(), "hi Ann".to_string()],
            "mode {:?}",
            mode
        );
    }
}

#[test]
fn deferred_mode_leaves_string_contents_alone() {
    let source = "x : 5\nlog \"a x b\"";

    let mut deferred = interpreter();
    deferred.run(source).expect("runs");
    assert_eq!(deferred.console().output, vec!["a x b".to_string()]);

    let mut textual = Interpreter::with_options(
        CapturedConsole::new(),
        Options::default().with_substitution(SubstitutionMode::Textual),
    );
    textual.run(source).expect("runs");
    assert_eq!(textual.console().output, vec!["a 5 b".to_string()]);
}

#[test]
fn minus_signs_in_both_substitution_modes() {
    let source = "x : 10\nlog 10 - 4\nlog x-1\nlog -x";
    let expected = [
        (SubstitutionMode::Deferred, ["10", "10", "-"]),
        (SubstitutionMode::Textual, ["10", "10", "-10"]),
    ];

    for (mode, lines) in expected {
        let mut interp = Interpreter::with_options(
            CapturedConsole::new(),
            Options::default().with_substitution(mode),
        );
        interp.run(source).expect("runs");
        assert_eq!(
            interp.console().output,
            lines.map(String::from).to_vec(),
            "mode {:?}",
            mode
        );
    }
}

#[test]
fn custom_consoles_plug_in() {
    #[derive(Default)]
    struct Upper {
        lines: Vec<String>,
    }

    impl Console for Upper {
        fn write_line(&mut self, text: &str) {
            self.lines.push(text.to_uppercase());
        }

        fn read_line(&mut self, _prompt: Option<&str>) -> std::io::Result<Option<String>> {
            Ok(Some("typed".to_string()))
        }

        fn report(&mut self, error: &PnaError) {
            self.lines.push(error.render_plain());
        }
    }

    let mut interp = Interpreter::new(Upper::default());
    interp
        .run("input \"?\" -> word\nlog word + \"!\"\nlog len")
        .expect("runs");
    assert_eq!(
        interp.into_console().lines,
        vec![
            "TYPED!".to_string(),
            "[LogError] len() takes exactly 1 argument, got 0".to_string(),
        ]
    );
}
