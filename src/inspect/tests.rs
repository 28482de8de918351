use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::frontend::source::MemorySource;
use crate::types::TypeKind;

fn session(files: &[(&str, &str)]) -> (Session, Arc<MemorySource>) {
    let source = files
        .iter()
        .fold(MemorySource::new(), |source, (path, text)| source.with_file(*path, *text));
    let source = Arc::new(source);
    let session = Session::with_source(Config::default(), source.clone());
    (session, source)
}

/// Display name of a value's type, `?` when unknown
fn value_str(session: &Session, pkg: PackageId, name: &str) -> String {
    session.slot_string(session.value_type(pkg, name))
}

#[test]
fn test_pointer_identity() {
    let (mut session, _) = session(&[(
        "a/a.go",
        "package a\n\ntype T struct{ X int }\n\nvar p *T\nvar q *T\nvar r = &T{X: 1}\n",
    )]);
    let a = session.inspect("a").unwrap();

    let p = session.value_type(a, "p").unwrap();
    assert_eq!(session.value_type(a, "q"), Some(p));
    assert_eq!(session.value_type(a, "r"), Some(p));
    assert_eq!(session.type_string(p), "*T");
    assert_eq!(session.ty(p).kind(), Some(TypeKind::Pointer));
    assert_eq!(session.named_type(a, "*T"), Some(p));
}

#[test]
fn test_inspection_is_idempotent() {
    let (mut session, source) = session(&[(
        "a/a.go",
        "package a\n\ntype T []int\n\nvar x T\nvar y = x[0]\n",
    )]);
    let a = session.inspect("a").unwrap();
    let types: Vec<(String, TypeId)> = session.package(a).types.iter().map(|(k, v)| (k.clone(), *v)).collect();
    let x = session.value_type(a, "x");

    assert_eq!(session.inspect("a").unwrap(), a);
    let again: Vec<(String, TypeId)> = session.package(a).types.iter().map(|(k, v)| (k.clone(), *v)).collect();
    assert_eq!(types, again);
    assert_eq!(session.value_type(a, "x"), x);
    assert_eq!(source.reads("a/a.go"), 1);
    assert_eq!(session.package(a).state, PackageState::Inspected);
}

#[test]
fn test_grouped_constants_inherit() {
    let (mut session, _) = session(&[(
        "a/a.go",
        r#"package a

const (
	A int64 = iota
	B
	C
)

const (
	X = "x"
	Y
)

const (
	I int = 1
	J = 2
	K = 3
)
"#,
    )]);
    let a = session.inspect("a").unwrap();

    assert_eq!(value_str(&session, a, "A"), "int64");
    assert_eq!(value_str(&session, a, "B"), "int64");
    assert_eq!(value_str(&session, a, "C"), "int64");
    assert_eq!(value_str(&session, a, "Y"), "string");

    let i = session.value_type(a, "I");
    assert_eq!(session.value_type(a, "J"), i);
    assert_eq!(session.value_type(a, "K"), i);
}

#[test]
fn test_multi_value_distribution() {
    let (mut session, _) = session(&[(
        "a/a.go",
        r#"package a

func pair() (int, string) { return 0, "" }

var a, b = pair()

var m map[string]float64
var v, ok = m["k"]

var i any
var n, isInt = i.(int)

var c, d = 1, "two"
"#,
    )]);
    let a = session.inspect("a").unwrap();

    assert_eq!(value_str(&session, a, "a"), "int");
    assert_eq!(value_str(&session, a, "b"), "string");
    assert_eq!(value_str(&session, a, "v"), "float64");
    assert_eq!(value_str(&session, a, "ok"), "bool");
    assert_eq!(value_str(&session, a, "n"), "int");
    assert_eq!(value_str(&session, a, "isInt"), "bool");
    assert_eq!(value_str(&session, a, "c"), "int");
    assert_eq!(value_str(&session, a, "d"), "string");
}

#[test]
fn test_binary_operand_promotion() {
    let (mut session, _) = session(&[(
        "a/a.go",
        "package a\n\nvar f float32\nvar g = 2 * f\nvar h = f * 2\nvar lt = f < 1\nvar sh = 1 << 3\nvar both = 1 + 2.5\n",
    )]);
    let a = session.inspect("a").unwrap();

    assert_eq!(value_str(&session, a, "g"), "float32");
    assert_eq!(value_str(&session, a, "h"), "float32");
    assert_eq!(value_str(&session, a, "lt"), "bool");
    assert_eq!(value_str(&session, a, "sh"), "int");
    assert_eq!(value_str(&session, a, "both"), "float64");
}

#[test]
fn test_imported_package_loads_lazily() {
    let (mut session, source) = session(&[
        (
            "app/main.go",
            "package app\n\nimport \"lib\"\n\nvar x = lib.A\nvar y lib.B\n",
        ),
        ("lib/a.go", "package lib\n\nvar A = 1\n\nvar Unused = undefined\n"),
        ("lib/b.go", "package lib\n\ntype B struct{ Name string }\n"),
    ]);
    let app = session.inspect("app").unwrap();
    let lib = session.package_id("lib").unwrap();

    assert_eq!(value_str(&session, app, "x"), "int");
    let y = session.value_type(app, "y").unwrap();
    assert_eq!(session.ty(y).package, Some(lib));
    assert_eq!(session.type_name(y, Some(app)), "lib.B");

    assert_eq!(source.reads("lib/a.go"), 1);
    assert_eq!(source.reads("lib/b.go"), 1);
    // only the referenced declarations were inspected
    assert_eq!(session.package(lib).state, PackageState::Parsed);
    assert!(!session.package(lib).values.contains_key("Unused"));
}

#[test]
fn test_import_cycle_terminates() {
    let (mut session, _) = session(&[
        (
            "a/a.go",
            "package a\n\nimport \"b\"\n\ntype T struct{ U *b.U }\n\nvar V = b.W\n",
        ),
        (
            "b/b.go",
            "package b\n\nimport \"a\"\n\ntype U struct{ T *a.T }\n\nvar W = 1\n",
        ),
    ]);
    let a = session.inspect_all("a").unwrap();
    let b = session.package_id("b").unwrap();

    assert_eq!(session.package(a).state, PackageState::Inspected);
    assert_eq!(session.package(b).state, PackageState::Inspected);
    assert_eq!(value_str(&session, a, "V"), "int");

    let t = session.named_type(a, "T").unwrap();
    assert_eq!(session.type_name(t, Some(a)), "T");
    assert_eq!(session.ty(t).kind(), Some(TypeKind::Struct));
    assert!(session.named_type(b, "U").is_some());
}

#[test]
fn test_unknown_qualifier_is_not_a_type() {
    let (mut session, _) = session(&[("a/a.go", "package a\n\nvar x = nope.X\n")]);
    let err = session.inspect("a").unwrap_err();
    assert!(matches!(err, Error::NotAType { ref name } if name == "nope.X"));
}

#[test]
fn test_missing_member_is_not_a_type() {
    let (mut session, _) = session(&[
        ("a/a.go", "package a\n\nimport \"lib\"\n\nvar x = lib.Missing\n"),
        ("lib/lib.go", "package lib\n\nvar Present = 1\n"),
    ]);
    let err = session.inspect("a").unwrap_err();
    assert!(matches!(err, Error::NotAType { ref name } if name == "lib.Missing"));
}

#[test]
fn test_missing_package_is_a_soft_miss() {
    let (mut session, _) = session(&[("a/a.go", "package a\n\nimport \"gone\"\n\nvar x = gone.X\nvar y = 1\n")]);
    let a = session.inspect_all("a").unwrap();

    assert_eq!(session.value_type(a, "x"), None);
    assert_eq!(value_str(&session, a, "y"), "int");
    let gone = session.package_id("gone").unwrap();
    assert!(session.package(gone).unavailable);
}

#[test]
fn test_self_referencing_constant() {
    let (mut session, _) = session(&[("a/a.go", "package a\n\nconst A = A\nconst B = 2\n")]);
    let a = session.inspect("a").unwrap();

    assert_eq!(session.value_type(a, "A"), None);
    assert_eq!(value_str(&session, a, "B"), "int");
}

#[test]
fn test_forward_reference_and_recursive_type() {
    let (mut session, _) = session(&[(
        "a/a.go",
        "package a\n\nvar head = list.next\n\nvar list Node\n\ntype Node struct {\n\tnext *Node\n\tval  int\n}\n",
    )]);
    let a = session.inspect("a").unwrap();

    let node = session.named_type(a, "Node").unwrap();
    let head = session.value_type(a, "head").unwrap();
    assert_eq!(session.type_string(head), "*Node");
    assert_eq!(session.ty(head).object.elem(), Some(node));
    assert_eq!(session.type_string(session.ty(node).underlying.unwrap()), "struct{next *Node; val int}");
}

#[test]
fn test_alias_and_defined_types() {
    let (mut session, _) = session(&[(
        "a/a.go",
        "package a\n\ntype MyInt = int\ntype Celsius float64\n\nvar i MyInt\nvar t Celsius\n",
    )]);
    let a = session.inspect("a").unwrap();

    assert_eq!(session.named_type(a, "MyInt"), session.universe().lookup_type("int"));
    let celsius = session.value_type(a, "t").unwrap();
    assert_eq!(session.type_string(celsius), "Celsius");
    assert_eq!(session.ty(celsius).underlying, session.universe().lookup_type("float64"));
    assert_eq!(value_str(&session, a, "i"), "int");
}

#[test]
fn test_selectors_and_methods() {
    let (mut session, _) = session(&[(
        "a/a.go",
        r#"package a

type Base struct{ ID string }

type P struct {
	Base
	X int
}

func (p *P) Name() string { return "" }

var p P
var pp = &p
var x = p.X
var id = p.ID
var name = p.Name()
var method = pp.Name
var expr = P.Name
"#,
    )]);
    let a = session.inspect("a").unwrap();

    assert_eq!(value_str(&session, a, "pp"), "*P");
    assert_eq!(value_str(&session, a, "x"), "int");
    assert_eq!(value_str(&session, a, "id"), "string");
    assert_eq!(value_str(&session, a, "name"), "string");
    assert_eq!(value_str(&session, a, "method"), "func() string");
    assert_eq!(value_str(&session, a, "expr"), "func() string");
    assert!(session.func_type(a, "P.Name").is_some());
}

#[test]
fn test_index_and_slice() {
    let (mut session, _) = session(&[(
        "a/a.go",
        "package a\n\nvar arr [4]int\nvar s = arr[1:]\nvar e = arr[0]\nvar str = \"abc\"\nvar ch = str[0]\nvar sub = str[1:]\n",
    )]);
    let a = session.inspect("a").unwrap();

    assert_eq!(value_str(&session, a, "arr"), "[4]int");
    assert_eq!(value_str(&session, a, "s"), "[]int");
    assert_eq!(value_str(&session, a, "e"), "int");
    assert_eq!(value_str(&session, a, "ch"), "uint8");
    assert_eq!(value_str(&session, a, "sub"), "string");
}

#[test]
fn test_builtin_calls() {
    let (mut session, _) = session(&[(
        "a/a.go",
        "package a\n\nvar np = new(int)\nvar mk = make([]string, 0)\nvar ap = append(mk, \"x\")\nvar l = len(mk)\nvar lo = min(2.5, 1)\n",
    )]);
    let a = session.inspect("a").unwrap();

    assert_eq!(value_str(&session, a, "np"), "*int");
    assert_eq!(value_str(&session, a, "mk"), "[]string");
    assert_eq!(value_str(&session, a, "ap"), "[]string");
    assert_eq!(value_str(&session, a, "l"), "int");
    assert_eq!(value_str(&session, a, "lo"), "float64");
}

#[test]
fn test_function_types() {
    let (mut session, _) = session(&[(
        "a/a.go",
        "package a\n\nfunc Sum(xs ...int) int { return 0 }\n\nvar less = func(a, b int) bool { return a < b }\nvar ch chan<- string\nvar recv <-chan int\nvar got = <-recv\n",
    )]);
    let a = session.inspect("a").unwrap();

    let sum = session.func_type(a, "Sum").unwrap();
    assert_eq!(session.type_string(sum), "func(...int) int");
    assert_eq!(value_str(&session, a, "less"), "func(int, int) bool");
    assert_eq!(value_str(&session, a, "ch"), "chan<- string");
    assert_eq!(value_str(&session, a, "got"), "int");
}

#[test]
fn test_eval_and_lookup() {
    let (mut session, _) = session(&[
        ("app/main.go", "package app\n\nimport \"lib\"\n\ntype T struct{ X []byte }\n\nvar t T\n"),
        ("lib/lib.go", "package lib\n\nfunc Load() (string, error) { return \"\", nil }\n"),
    ]);

    let x = session.eval("app", "t.X[0]").unwrap().unwrap();
    assert_eq!(session.type_string(x), "uint8");
    let cmp = session.eval("app", "len(t.X) > 0").unwrap().unwrap();
    assert_eq!(session.type_string(cmp), "bool");

    let load = session.lookup("app", "lib.Load").unwrap().unwrap();
    assert_eq!(session.type_string(load), "func() (string, error)");
    assert!(session.lookup("app", "Nothing").unwrap().is_none());
}

#[test]
fn test_parse_error_names_file() {
    let (mut session, _) = session(&[("a/a.go", "package a\n\nvar = 1\n")]);
    let err = session.inspect("a").unwrap_err();

    assert!(err.is_parse());
    assert!(err.to_string().contains("a/a.go"));
    assert_eq!(session.package(session.package_id("a").unwrap()).state, PackageState::Unparsed);
}

#[test]
fn test_unresolved_left_operand_stays_unresolved() {
    let (mut session, _) = session(&[(
        "a/a.go",
        "package a\n\nimport \"math\"\n\nvar scaled = math.Pi * 2\nvar doubled = missing * 2\nvar lit = 2 * missing\n",
    )]);
    let a = session.inspect_all("a").unwrap();

    assert_eq!(session.value_type(a, "scaled"), None);
    assert_eq!(session.value_type(a, "doubled"), None);
    assert_eq!(session.value_type(a, "lit"), None);
}

#[test]
fn test_unresolved_chain_is_attributed_once() {
    const LINKS: usize = 40;
    let mut text = String::from("package a\n\nvar v0 = missing\n");
    for i in 1..LINKS {
        text.push_str(&format!("var v{} = v{} + v{}\n", i, i - 1, i - 1));
    }
    let (mut session, _) = session(&[("a/a.go", text.as_str())]);
    let a = session.inspect("a").unwrap();

    assert_eq!(session.value_type(a, &format!("v{}", LINKS - 1)), None);
    assert!(session.retries <= LINKS, "{} retries", session.retries);

    // nothing gained a type, so a later reference does not re-evaluate
    let before = session.retries;
    assert!(session.lookup("a", &format!("v{}", LINKS - 1)).unwrap().is_none());
    assert_eq!(session.retries, before);

    // once something gains a type, each link is attempted again exactly once
    session.advance();
    assert!(session.lookup("a", &format!("v{}", LINKS - 1)).unwrap().is_none());
    assert_eq!(session.retries, before + LINKS);
}

#[test]
fn test_shapes_with_unresolved_slots_are_distinct() {
    let (mut session, _) = session(&[(
        "a/a.go",
        "package a\n\nimport (\n\t\"x\"\n\t\"y\"\n)\n\nfunc F(p x.A) {}\nfunc G(q y.B) {}\nfunc H(n int) {}\nfunc K(m int) {}\n",
    )]);
    let a = session.inspect("a").unwrap();

    let f = session.func_type(a, "F").unwrap();
    let g = session.func_type(a, "G").unwrap();
    assert_ne!(f, g);
    assert_eq!(session.type_string(f), "func(?)");
    assert!(session.named_type(a, "func(?)").is_none());

    let h = session.func_type(a, "H").unwrap();
    assert_eq!(session.func_type(a, "K"), Some(h));
}
