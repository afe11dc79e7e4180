//! End-to-end tests for the batch compiler driver.

use emberscript::prelude::*;

fn host_compiler() -> Compiler {
    let mut compiler = Compiler::new();
    compiler.register_trigger(TriggerType::new("proc"));
    compiler.register_trigger(TriggerType::new("clientscript"));
    compiler.register_command(CommandInfo {
        opcode: 100,
        name: "mes".into(),
        return_type: Type::unit(),
        arguments: vec![PrimitiveType::String.into()],
        flags: CommandFlags::empty(),
        transmit_type: None,
    });
    compiler.register_constant(ConstantInfo {
        name: "max_energy".into(),
        ty: PrimitiveType::Int,
        value: Value::Int(10000),
    });
    compiler.register_variable(VariableInfo {
        domain: VarDomain::Player,
        name: "energy".into(),
        ty: PrimitiveType::Int,
    });
    compiler
}

#[test]
fn compiles_a_clean_batch() {
    let mut compiler = host_compiler();
    let result = compiler.compile(
        "[proc,drain](int $amount)(int) \
             %energy = %energy - $amount; \
             return %energy; \
         [clientscript,on_tick] \
             def_int $left = ~drain(50); \
             if ($left <= 0) { mes(\"exhausted\"); }",
    );

    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(result.scripts.len(), 2);
    assert_eq!(result.scripts[0].name, "[proc,drain]");
    assert_eq!(result.scripts[1].name, "[clientscript,on_tick]");
}

#[test]
fn batch_errors_suppress_bytecode() {
    let mut compiler = host_compiler();
    let result = compiler.compile(
        "[proc,good] return; \
         [proc,bad] def_int $x = \"oops\";",
    );

    assert!(result.has_errors());
    assert!(result.scripts.is_empty());
}

#[test]
fn diagnostics_surface_from_every_phase() {
    let mut compiler = host_compiler();
    // A lexical error (stray '@'), a syntax error (missing initializer),
    // and a semantic error (unresolved variable).
    let result = compiler.compile(
        "[proc,one] @ return; \
         [proc,two] def_int $x = ; \
         [proc,three] $ghost = 1;",
    );

    assert!(result.has_errors());
    assert!(result.diagnostics.len() >= 3);
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unexpected character"))
    );
    assert!(result.diagnostics.iter().any(|d| d.message.contains("ghost")));
}

#[test]
fn duplicate_scripts_are_reported() {
    let mut compiler = host_compiler();
    let result = compiler.compile("[proc,test] return; [proc,test] return;");

    let duplicates: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.message.contains("duplicate script '[proc,test]'"))
        .collect();
    assert_eq!(duplicates.len(), 1);
    assert!(result.scripts.is_empty());
}

#[test]
fn recompiling_the_same_batch_stays_clean() {
    let mut compiler = host_compiler();
    let source = "[proc,test] mes(\"hi\"); return;";

    let first = compiler.compile(source);
    assert!(!first.has_errors(), "{:?}", first.diagnostics);
    let second = compiler.compile(source);
    assert!(!second.has_errors(), "{:?}", second.diagnostics);
    assert_eq!(second.scripts.len(), 1);
}

#[test]
fn diagnostics_carry_source_positions() {
    let mut compiler = host_compiler();
    let result = compiler.compile("[proc,first]\n    return;\n[proc,second]\n    $nope = 1;\n");

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].severity, Severity::Error);
    assert_eq!(result.diagnostics[0].span.line, 4);
}

#[test]
fn check_reports_without_generating() {
    let mut compiler = host_compiler();

    let clean = compiler.check("[proc,test](int $n)(int) return $n + ^max_energy;");
    assert!(clean.is_empty(), "{:?}", clean);

    let broken = compiler.check("[proc,test] return 1;");
    assert_eq!(broken.len(), 1);
    assert!(broken[0].message.contains("return"));
}

#[test]
fn trigger_contracts_apply_across_a_batch() {
    let mut compiler = host_compiler();
    compiler.register_trigger(
        TriggerType::new("on_damage")
            .with_arguments(vec![PrimitiveType::Int.into()])
            .with_returns(vec![PrimitiveType::Bool.into()]),
    );

    let ok = compiler.compile("[on_damage,shield](int $dmg)(bool) return $dmg < 10;");
    assert!(!ok.has_errors(), "{:?}", ok.diagnostics);

    let bad = compiler.compile("[on_damage,unarmored](string $who)(bool) return true;");
    assert!(bad.has_errors());
    assert!(
        bad.diagnostics
            .iter()
            .any(|d| d.message.contains("expects parameters"))
    );
}
